//! Runs one [`Command`]: redirections around a builtin or an external program.

use crate::builtin::{Builtin, BuiltinAction};
use crate::command::{Command, EXIT_FAILURE, EXIT_SUCCESS, ExitCode};
use crate::context::Context;
use crate::external;
use crate::redirect;
use crate::signals;
use tracing::debug;

/// What the read-eval loop should do after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading; the command finished with this status.
    Continue(ExitCode),
    /// Stop the interpreter with this status (`exit`).
    Exit(ExitCode),
}

impl Outcome {
    pub fn status(self) -> ExitCode {
        match self {
            Outcome::Continue(status) | Outcome::Exit(status) => status,
        }
    }
}

pub struct Executor<'a> {
    ctx: &'a Context,
}

impl<'a> Executor<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Execute `command` and report how it went.
    ///
    /// Redirections are applied before dispatch and always undone afterwards,
    /// whether the command ran, failed to start, or was detached.
    pub fn execute(&self, command: &Command) -> Outcome {
        let Some(name) = command.name() else {
            return Outcome::Continue(EXIT_SUCCESS);
        };

        let saved = match redirect::apply(&command.redirections) {
            Ok(saved) => saved,
            Err(err) => {
                self.ctx.report(err);
                return Outcome::Continue(EXIT_FAILURE);
            }
        };

        let outcome = match Builtin::lookup(name) {
            Some(builtin) => {
                debug!(builtin = builtin.name(), "running builtin");
                self.run_builtin(builtin, &command.argv)
            }
            None => Outcome::Continue(self.run_external(command)),
        };

        saved.restore();
        outcome
    }

    fn run_builtin(&self, builtin: Builtin, argv: &[String]) -> Outcome {
        match builtin.invoke(argv) {
            BuiltinAction::Status(status) => Outcome::Continue(status),
            BuiltinAction::Exit(status) => Outcome::Exit(status),
            BuiltinAction::Replace(argv) => Outcome::Continue(self.replace_process(&argv)),
        }
    }

    /// `exec`: become `argv[0]`. Returns only if that fails.
    fn replace_process(&self, argv: &[String]) -> ExitCode {
        let c_argv = match external::to_c_argv(argv) {
            Ok(c_argv) => c_argv,
            Err(err) => {
                eprintln!("exec: {err}");
                return EXIT_FAILURE;
            }
        };
        let Some(program) = c_argv.first() else {
            return EXIT_FAILURE;
        };

        debug!(program = %argv[0], "replacing interpreter");
        let interactive = self.ctx.is_interactive();
        signals::prepare_exec(interactive);
        let errno = external::exec(program, &c_argv);

        eprintln!("exec: {}: {}", argv[0], errno.desc());
        if let Err(err) = signals::install_interpreter(interactive) {
            self.ctx.report(format_args!("cannot restore signal dispositions: {}", err.desc()));
        }
        EXIT_FAILURE
    }

    fn run_external(&self, command: &Command) -> ExitCode {
        let c_argv = match external::to_c_argv(&command.argv) {
            Ok(c_argv) => c_argv,
            Err(err) => {
                self.ctx.report(format_args!("{}: {err}", command.argv[0]));
                return EXIT_FAILURE;
            }
        };

        let child = match external::spawn(
            self.ctx.program_name(),
            &c_argv,
            self.ctx.is_interactive(),
            command.detached,
        ) {
            Ok(child) => child,
            Err(errno) => {
                self.ctx.report(format_args!("fork: {}", errno.desc()));
                return EXIT_FAILURE;
            }
        };

        if command.detached {
            return EXIT_SUCCESS;
        }

        match external::wait_for(child) {
            Ok(status) => status,
            Err(errno) => {
                self.ctx.report(format_args!("wait: {}", errno.desc()));
                EXIT_FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::lock_current_dir;
    use crate::command::{RedirectMode, Redirection};
    use std::env;
    use std::time::{Duration, Instant};

    fn command(words: &[&str]) -> Command {
        Command {
            argv: words.iter().map(|w| w.to_string()).collect(),
            ..Command::default()
        }
    }

    fn run(cmd: &Command) -> Outcome {
        let ctx = Context::new("tvsh", false);
        Executor::new(&ctx).execute(cmd)
    }

    #[test]
    fn test_empty_command_is_success_and_skips_redirections() {
        let cmd = Command {
            redirections: vec![Redirection::new(
                0,
                RedirectMode::ReadOnly,
                "/no/such/file/anywhere",
            )],
            ..Command::default()
        };
        assert_eq!(run(&cmd), Outcome::Continue(EXIT_SUCCESS));
    }

    #[test]
    fn test_external_status_is_returned() {
        assert_eq!(run(&command(&["true"])), Outcome::Continue(0));
        assert_eq!(run(&command(&["false"])), Outcome::Continue(1));
    }

    #[test]
    fn test_missing_program_fails() {
        assert_eq!(
            run(&command(&["no-such-program-for-tvsh-tests"])),
            Outcome::Continue(external::EXIT_NOT_FOUND)
        );
    }

    #[test]
    fn test_detached_command_returns_immediately() {
        let mut cmd = command(&["sleep", "5"]);
        cmd.detached = true;
        let started = Instant::now();
        assert_eq!(run(&cmd), Outcome::Continue(EXIT_SUCCESS));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_failed_redirection_skips_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let cmd = Command {
            argv: vec!["touch".into(), marker.to_string_lossy().into_owned()],
            redirections: vec![Redirection::new(
                60,
                RedirectMode::ReadOnly,
                dir.path().join("missing").to_string_lossy(),
            )],
            detached: false,
        };
        assert_eq!(run(&cmd), Outcome::Continue(EXIT_FAILURE));
        assert!(!marker.exists());
    }

    #[test]
    fn test_exit_builtin() {
        assert_eq!(run(&command(&["exit", "4"])), Outcome::Exit(4));
        assert_eq!(run(&command(&["exit"])), Outcome::Exit(0));
        assert_eq!(run(&command(&["exit", "1", "2"])), Outcome::Continue(EXIT_FAILURE));
    }

    #[test]
    fn test_failed_exec_is_recoverable() {
        assert_eq!(
            run(&command(&["exec", "/no/such/program/for/tvsh"])),
            Outcome::Continue(EXIT_FAILURE)
        );
        assert_eq!(run(&command(&["exec"])), Outcome::Continue(EXIT_FAILURE));
    }

    #[test]
    fn test_cd_builtin_runs_in_process() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let target = std::fs::canonicalize(temp.path()).unwrap();

        let outcome = run(&command(&["cd", &target.to_string_lossy()]));
        let now = std::fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).unwrap();

        assert_eq!(outcome, Outcome::Continue(EXIT_SUCCESS));
        assert_eq!(now, target);
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(Outcome::Continue(3).status(), 3);
        assert_eq!(Outcome::Exit(5).status(), 5);
    }
}
