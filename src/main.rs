use anyhow::{Context as _, Result};
use argh::FromArgs;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tvsh::Interpreter;
use tvsh::command::{EXIT_FAILURE, ExitCode};
use tvsh::context::Context;
use tvsh::signals;
use tvsh::source::{BufSource, Source, TerminalSource};

#[derive(FromArgs, Debug)]
/// A tiny line-oriented command interpreter.
/// Reads commands from standard input, or from a script file when one is given.
struct Args {
    #[argh(positional)]
    /// script to run instead of reading standard input.
    script: Option<PathBuf>,
}

fn main() {
    // Respects RUST_LOG; silent otherwise.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();
    let program_name = std::env::args().next().unwrap_or_else(|| "tvsh".to_string());

    let code = match run(&program_name, args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{program_name}: {err:#}");
            EXIT_FAILURE
        }
    };
    process::exit(code);
}

fn run(program_name: &str, args: Args) -> Result<ExitCode> {
    let (source, interactive): (Box<dyn Source>, bool) = match args.script {
        Some(path) => {
            let file = File::open(&path).with_context(|| path.display().to_string())?;
            (Box::new(BufSource::new(BufReader::new(file))), false)
        }
        None if io::stdin().is_terminal() && io::stderr().is_terminal() => {
            let terminal = TerminalSource::new().context("cannot set up the terminal")?;
            (Box::new(terminal), true)
        }
        None => (Box::new(BufSource::new(io::stdin().lock())), false),
    };

    signals::install_interpreter(interactive).context("cannot set signal dispositions")?;

    let mut interpreter = Interpreter::new(Context::new(program_name, interactive), source);
    Ok(interpreter.run())
}
