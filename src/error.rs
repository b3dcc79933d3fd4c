//! Error types shared by the reader, the command builder and the redirection engine.

use nix::errno::Errno;
use rustyline::error::ReadlineError;
use std::io;
use thiserror::Error;

/// Failure to obtain more input from a [`Source`](crate::source::Source).
#[derive(Error, Debug)]
pub enum ReadError {
    /// The user interrupted the read (Ctrl-C at the prompt).
    #[error("interrupted")]
    Interrupted,

    /// The underlying reader failed.
    #[error("read error: {0}")]
    Io(#[from] io::Error),

    /// The line editor failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] ReadlineError),
}

/// Errors produced while building a command from tokens.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A redirection operator was not followed by a word naming its target.
    #[error("syntax error: missing file name after `{operator}`")]
    MissingRedirectTarget { operator: String },

    /// Input ended in the middle of a command.
    #[error("syntax error: unexpected end of input")]
    UnexpectedEndOfInput,

    #[error(transparent)]
    Read(#[from] ReadError),
}

/// A redirection target could not be opened or installed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {}", .errno.desc())]
pub struct RedirectError {
    pub path: String,
    pub errno: Errno,
}
