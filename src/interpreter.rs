use crate::command::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_SYNTAX, ExitCode};
use crate::context::Context;
use crate::error::{ParseError, ReadError};
use crate::executor::{Executor, Outcome};
use crate::lexer::Lexer;
use crate::parser::read_command;
use crate::source::Source;
use tracing::{debug, info};

/// The read-eval loop: reads commands from a [`Source`] and runs them one by one.
///
/// Example
/// ```
/// use tvsh::Interpreter;
/// use tvsh::context::Context;
/// use tvsh::source::BufSource;
///
/// let script = "true\nexit 3\necho never\n";
/// let mut sh = Interpreter::new(Context::new("tvsh", false), BufSource::new(script.as_bytes()));
/// assert_eq!(sh.run(), 3);
/// ```
pub struct Interpreter<S> {
    ctx: Context,
    lexer: Lexer<S>,
    last_status: ExitCode,
}

impl<S: Source> Interpreter<S> {
    pub fn new(ctx: Context, source: S) -> Self {
        Self {
            ctx,
            lexer: Lexer::new(source),
            last_status: EXIT_SUCCESS,
        }
    }

    /// Status of the most recently completed command.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Run until `exit`, end of input, or an error that ends a script.
    ///
    /// Returns the status the interpreter process should exit with. At end of
    /// input that is the status of the last command.
    pub fn run(&mut self) -> ExitCode {
        info!(interactive = self.ctx.is_interactive(), "interpreter started");
        loop {
            self.lexer.source_mut().begin_command();
            match read_command(&mut self.lexer) {
                // Blank lines, and the line end after a trailing `;` or `&`,
                // leave the last status alone.
                Ok(Some(command)) if command.is_empty() => {}
                Ok(Some(command)) => {
                    match Executor::new(&self.ctx).execute(&command) {
                        Outcome::Continue(status) => self.last_status = status,
                        Outcome::Exit(status) => {
                            debug!(status, "exit requested");
                            return status;
                        }
                    }
                }
                Ok(None) => {
                    if self.ctx.is_interactive() {
                        // Leave the terminal on a fresh line after Ctrl-D.
                        println!();
                    }
                    debug!(status = self.last_status, "end of input");
                    return self.last_status;
                }
                Err(ParseError::Read(err)) => {
                    if let Some(status) = self.read_failed(err) {
                        return status;
                    }
                }
                Err(err) => {
                    self.ctx.report(&err);
                    if !self.ctx.is_interactive() {
                        return EXIT_SYNTAX;
                    }
                    self.lexer.discard_pending();
                    self.last_status = EXIT_SYNTAX;
                }
            }
        }
    }

    /// Returns the exit status when the loop has to stop.
    fn read_failed(&mut self, err: ReadError) -> Option<ExitCode> {
        match err {
            ReadError::Interrupted if self.ctx.is_interactive() => {
                // Ctrl-C abandons the partial command and shows a new prompt.
                self.lexer.discard_pending();
                None
            }
            err if self.ctx.is_interactive() => {
                self.ctx.report(&err);
                self.lexer.discard_pending();
                None
            }
            err => {
                self.ctx.report(&err);
                Some(EXIT_FAILURE)
            }
        }
    }
}
