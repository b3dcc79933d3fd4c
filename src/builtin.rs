use crate::command::{EXIT_FAILURE, EXIT_SUCCESS, ExitCode};
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use nix::unistd::chdir;
use std::env;
use std::path::PathBuf;

/// What a builtin asks the executor to do once it has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinAction {
    /// Carry on with this status.
    Status(ExitCode),
    /// Terminate the interpreter with this status.
    Exit(ExitCode),
    /// Replace the interpreter with this program and arguments.
    Replace(Vec<String>),
}

/// The closed set of commands run inside the interpreter process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    ExecReplace,
    ChangeDirectory,
}

const TABLE: [(&str, Builtin); 3] = [
    ("exit", Builtin::Exit),
    ("exec", Builtin::ExecReplace),
    ("cd", Builtin::ChangeDirectory),
];

impl Builtin {
    /// Find the builtin called exactly `name`, if any.
    pub fn lookup(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(builtin_name, _)| *builtin_name == name)
            .map(|&(_, builtin)| builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => ExitArgs::name(),
            Builtin::ExecReplace => ExecArgs::name(),
            Builtin::ChangeDirectory => CdArgs::name(),
        }
    }

    /// Run the builtin with the full argument vector, `argv[0]` included.
    ///
    /// Usage and runtime errors are reported on standard error as
    /// `<builtin>: <detail>` and turn into a failure status.
    pub fn invoke(self, argv: &[String]) -> BuiltinAction {
        match self {
            Builtin::Exit => run::<ExitArgs>(argv),
            Builtin::ExecReplace => run::<ExecArgs>(argv),
            Builtin::ChangeDirectory => run::<CdArgs>(argv),
        }
    }
}

/// Argument parsing and body of one builtin.
///
/// Arguments are parsed using the [`argh`] crate (`FromArgs`).
trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    fn execute(self) -> Result<BuiltinAction>;
}

fn run<T: BuiltinCommand>(argv: &[String]) -> BuiltinAction {
    match T::from_args(&[T::name()], &operands(argv)) {
        Ok(cmd) => match cmd.execute() {
            Ok(action) => action,
            Err(err) => {
                eprintln!("{}: {:#}", T::name(), err);
                BuiltinAction::Status(EXIT_FAILURE)
            }
        },
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => {
            print!("{output}");
            BuiltinAction::Status(EXIT_SUCCESS)
        }
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => {
            eprint!("{}: {}", T::name(), output);
            if !output.ends_with('\n') {
                eprintln!();
            }
            BuiltinAction::Status(EXIT_FAILURE)
        }
    }
}

/// Arguments after `argv[0]`, all taken as positionals.
///
/// Builtins have no flags, so words like `-1`, `-dir` or `-l` are operands.
/// A lone `--help` still asks for the usage text.
fn operands(argv: &[String]) -> Vec<&str> {
    let rest = argv.iter().skip(1).map(String::as_str);
    if argv.len() == 2 && argv[1] == "--help" {
        rest.collect()
    } else {
        std::iter::once("--").chain(rest).collect()
    }
}

#[derive(FromArgs, Debug)]
/// Exit the interpreter.
struct ExitArgs {
    #[argh(positional)]
    /// exit status; defaults to 0.
    code: Option<ExitCode>,
}

impl BuiltinCommand for ExitArgs {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self) -> Result<BuiltinAction> {
        Ok(BuiltinAction::Exit(self.code.unwrap_or(EXIT_SUCCESS)))
    }
}

#[derive(FromArgs, Debug)]
/// Replace the interpreter with another program.
struct ExecArgs {
    #[argh(positional)]
    /// program to run, looked up in PATH.
    command: String,

    #[argh(positional)]
    /// arguments passed to the program unchanged.
    args: Vec<String>,
}

impl BuiltinCommand for ExecArgs {
    fn name() -> &'static str {
        "exec"
    }

    fn execute(self) -> Result<BuiltinAction> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.command);
        argv.extend(self.args);
        Ok(BuiltinAction::Replace(argv))
    }
}

#[derive(FromArgs, Debug)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
struct CdArgs {
    #[argh(positional)]
    /// directory to switch to; defaults to $HOME when omitted.
    target: Option<String>,
}

impl BuiltinCommand for CdArgs {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self) -> Result<BuiltinAction> {
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("HOME not set"))?,
        };
        chdir(target.as_path()).map_err(|errno| anyhow!("{}: {}", target.display(), errno.desc()))?;
        Ok(BuiltinAction::Status(EXIT_SUCCESS))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// The working directory is process-wide; tests that change it take this lock.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(Builtin::lookup("exit"), Some(Builtin::Exit));
        assert_eq!(Builtin::lookup("exec"), Some(Builtin::ExecReplace));
        assert_eq!(Builtin::lookup("cd"), Some(Builtin::ChangeDirectory));
        assert_eq!(Builtin::lookup("CD"), None);
        assert_eq!(Builtin::lookup("cd "), None);
        assert_eq!(Builtin::lookup("echo"), None);
    }

    #[test]
    fn test_names_match_table() {
        for (name, builtin) in TABLE {
            assert_eq!(builtin.name(), name);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Builtin::Exit.invoke(&argv(&["exit"])), BuiltinAction::Exit(0));
        assert_eq!(Builtin::Exit.invoke(&argv(&["exit", "3"])), BuiltinAction::Exit(3));
    }

    #[test]
    fn test_exit_usage_errors_do_not_exit() {
        assert_eq!(
            Builtin::Exit.invoke(&argv(&["exit", "1", "2"])),
            BuiltinAction::Status(EXIT_FAILURE)
        );
        assert_eq!(
            Builtin::Exit.invoke(&argv(&["exit", "abc"])),
            BuiltinAction::Status(EXIT_FAILURE)
        );
    }

    #[test]
    fn test_exec_requests_replacement() {
        assert_eq!(
            Builtin::ExecReplace.invoke(&argv(&["exec", "ls", "-l", "/tmp"])),
            BuiltinAction::Replace(argv(&["ls", "-l", "/tmp"]))
        );
    }

    #[test]
    fn test_exec_passes_flags_through() {
        assert_eq!(
            Builtin::ExecReplace.invoke(&argv(&["exec", "ls", "-l", "--help"])),
            BuiltinAction::Replace(argv(&["ls", "-l", "--help"]))
        );
        assert_eq!(
            Builtin::ExecReplace.invoke(&argv(&["exec", "sh", "-c", "exit 4"])),
            BuiltinAction::Replace(argv(&["sh", "-c", "exit 4"]))
        );
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert_eq!(
            Builtin::Exit.invoke(&argv(&["exit", "--help"])),
            BuiltinAction::Status(EXIT_SUCCESS)
        );
    }

    #[test]
    fn test_exit_with_negative_code() {
        assert_eq!(Builtin::Exit.invoke(&argv(&["exit", "-1"])), BuiltinAction::Exit(-1));
    }

    #[test]
    fn test_cd_into_directory_starting_with_dash() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let dashed = temp.path().join("-dir");
        fs::create_dir(&dashed).unwrap();
        env::set_current_dir(temp.path()).unwrap();

        let action = Builtin::ChangeDirectory.invoke(&argv(&["cd", "-dir"]));
        let new_cwd = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).unwrap();

        assert_eq!(action, BuiltinAction::Status(EXIT_SUCCESS));
        assert_eq!(new_cwd, fs::canonicalize(&dashed).unwrap());
    }

    #[test]
    fn test_exec_without_command_is_usage_error() {
        assert_eq!(
            Builtin::ExecReplace.invoke(&argv(&["exec"])),
            BuiltinAction::Status(EXIT_FAILURE)
        );
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let action = Builtin::ChangeDirectory
            .invoke(&argv(&["cd", &canonical_temp.to_string_lossy()]));
        let new_cwd = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).unwrap();

        assert_eq!(action, BuiltinAction::Status(EXIT_SUCCESS));
        assert_eq!(new_cwd, canonical_temp);
    }

    #[test]
    fn test_cd_without_argument_goes_home() {
        let Some(home) = env::var_os("HOME") else {
            return;
        };
        let Ok(home) = fs::canonicalize(home) else {
            return;
        };
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();

        let action = Builtin::ChangeDirectory.invoke(&argv(&["cd"]));
        let new_cwd = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).unwrap();

        assert_eq!(action, BuiltinAction::Status(EXIT_SUCCESS));
        assert_eq!(new_cwd, home);
    }

    #[test]
    fn test_cd_to_missing_directory_leaves_cwd() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("does-not-exist");

        let action = Builtin::ChangeDirectory.invoke(&argv(&["cd", &missing.to_string_lossy()]));

        assert_eq!(action, BuiltinAction::Status(EXIT_FAILURE));
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_with_two_arguments_is_usage_error() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();

        let action = Builtin::ChangeDirectory.invoke(&argv(&["cd", "/", "/tmp"]));

        assert_eq!(action, BuiltinAction::Status(EXIT_FAILURE));
        assert_eq!(env::current_dir().unwrap(), orig);
    }
}
