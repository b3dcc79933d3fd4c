//! Line-oriented input sources feeding the lexer.
//!
//! A [`Source`] hands out one line at a time, newline included. Scripts and
//! piped standard input go through [`BufSource`]; a terminal goes through
//! [`TerminalSource`], which owns the prompt.

use crate::error::ReadError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::BufRead;

/// Prompt printed before reading a new command interactively.
pub const PROMPT: &str = "$ ";

pub trait Source {
    /// Read the next line including its terminating newline, if it has one.
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    fn read_line(&mut self) -> Result<Option<String>, ReadError>;

    /// Called by the read-eval loop before each command is read.
    fn begin_command(&mut self) {}
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        (**self).read_line()
    }

    fn begin_command(&mut self) {
        (**self).begin_command()
    }
}

/// Reads from any buffered reader: script files, pipes, in-memory text.
pub struct BufSource<R> {
    reader: R,
}

impl<R: BufRead> BufSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Source for BufSource<R> {
    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

/// Interactive terminal input through `rustyline`.
///
/// The prompt is shown only for the first line of a command; continuation
/// lines are read with an empty prompt.
pub struct TerminalSource {
    editor: DefaultEditor,
    prompt_armed: bool,
}

impl TerminalSource {
    pub fn new() -> Result<Self, ReadError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            prompt_armed: true,
        })
    }
}

impl Source for TerminalSource {
    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        let prompt = if self.prompt_armed { PROMPT } else { "" };
        self.prompt_armed = false;
        match self.editor.readline(prompt) {
            Ok(mut line) => {
                line.push('\n');
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(ReadError::Interrupted),
            Err(err) => Err(err.into()),
        }
    }

    fn begin_command(&mut self) {
        self.prompt_armed = true;
    }
}
