//! A small line-oriented command interpreter.
//!
//! Input is read one line at a time from a [`source::Source`], split into
//! tokens by the [`lexer`], assembled into a [`command::Command`] by the
//! [`parser`] and run by the [`executor`]. Each command may carry descriptor
//! redirections (`<`, `>`, `>>` with an optional descriptor digit), which the
//! [`redirect`] module applies around the command and undoes afterwards, and
//! may be detached with `&`.
//!
//! Three builtins run inside the interpreter process: `exit`, `exec` and `cd`.
//! Everything else is looked up in `PATH` and run in a child process.
//!
//! The main entry point is [`Interpreter`].

pub mod builtin;
pub mod command;
pub mod context;
pub mod error;
pub mod executor;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod redirect;
pub mod signals;
pub mod source;

/// Just a convenient re-export of the read-eval loop.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
