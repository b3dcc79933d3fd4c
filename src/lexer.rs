//! A module implementing lexical analysis (tokenization) for the command language.
//!
//! The lexer pulls characters from a [`Source`] one line at a time and keeps a
//! single character of pushback, which is all the grammar needs: `2>` and
//! `>>` are recognised by looking one character ahead.

use crate::command::{RedirectMode, escape, is_blank};
use crate::error::ReadError;
use crate::source::Source;
use std::fmt;
use std::os::unix::io::RawFd;
use tracing::trace;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word with escapes already resolved.
    Word(String),
    /// A redirection operator: `<`, `>`, `>>`, optionally prefixed by a digit.
    Redirection { fd: RawFd, mode: RedirectMode },
    /// `&`
    Detach,
    /// `;`
    Separator,
    /// A newline.
    EndOfLine,
    /// The source is exhausted.
    EndOfInput,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(&escape(w)),
            Token::Redirection { fd, mode } if *fd == mode.default_fd() => {
                f.write_str(mode.operator())
            }
            Token::Redirection { fd, mode } => write!(f, "{fd}{}", mode.operator()),
            Token::Detach => f.write_str("&"),
            Token::Separator => f.write_str(";"),
            Token::EndOfLine => f.write_str("newline"),
            Token::EndOfInput => f.write_str("end of input"),
        }
    }
}

pub struct Lexer<S> {
    source: S,
    line: Vec<char>,
    pos: usize,
    pushback: Option<char>,
    exhausted: bool,
}

impl<S: Source> Lexer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            line: Vec::new(),
            pos: 0,
            pushback: None,
            exhausted: false,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drop whatever is left of the current line, including a pushed-back character.
    ///
    /// The next token will come from a freshly read line.
    pub fn discard_pending(&mut self) {
        self.line.clear();
        self.pos = 0;
        self.pushback = None;
    }

    /// Produce the next token.
    ///
    /// End of input in the middle of a word terminates the word; the following
    /// call then yields [`Token::EndOfInput`].
    pub fn next_token(&mut self) -> Result<Token, ReadError> {
        let token = loop {
            let Some(ch) = self.skip_blanks()? else {
                break Token::EndOfInput;
            };
            match ch {
                '\n' => break Token::EndOfLine,
                '&' => break Token::Detach,
                ';' => break Token::Separator,
                '<' | '>' => break self.read_redirection(ch, None)?,
                d if d.is_ascii_digit() => {
                    match self.read_char()? {
                        Some(op @ ('<' | '>')) => {
                            let fd = d.to_digit(10).map(|n| n as RawFd);
                            break self.read_redirection(op, fd)?;
                        }
                        Some(other) => self.unread_char(other),
                        None => {}
                    }
                    let mut word = String::from(d);
                    self.read_word(None, &mut word)?;
                    break Token::Word(word);
                }
                c => {
                    let mut word = String::new();
                    self.read_word(Some(c), &mut word)?;
                    // A run of line continuations leaves nothing behind.
                    if !word.is_empty() {
                        break Token::Word(word);
                    }
                }
            }
        };
        trace!(%token, "lexed");
        Ok(token)
    }

    fn read_redirection(&mut self, op: char, fd: Option<RawFd>) -> Result<Token, ReadError> {
        let mode = if op == '<' {
            RedirectMode::ReadOnly
        } else {
            match self.read_char()? {
                Some('>') => RedirectMode::WriteAppend,
                Some(other) => {
                    self.unread_char(other);
                    RedirectMode::WriteTruncate
                }
                None => RedirectMode::WriteTruncate,
            }
        };
        Ok(Token::Redirection {
            fd: fd.unwrap_or_else(|| mode.default_fd()),
            mode,
        })
    }

    /// Accumulate a word into `out`, starting with `first` when given.
    ///
    /// Stops before blanks, newlines, `&`, `;`, `<`, `>` and end of input.
    /// Blanks are consumed; every other terminator is pushed back.
    fn read_word(&mut self, first: Option<char>, out: &mut String) -> Result<(), ReadError> {
        let mut next = match first {
            Some(c) => Some(c),
            None => self.read_char()?,
        };
        while let Some(ch) = next {
            match ch {
                '\\' => match self.read_char()? {
                    Some('\n') => {}
                    Some(escaped) => out.push(escaped),
                    None => return Ok(()),
                },
                c if is_blank(c) => return Ok(()),
                '\n' | '&' | ';' | '<' | '>' => {
                    self.unread_char(ch);
                    return Ok(());
                }
                c => out.push(c),
            }
            next = self.read_char()?;
        }
        Ok(())
    }

    fn skip_blanks(&mut self) -> Result<Option<char>, ReadError> {
        loop {
            match self.read_char()? {
                Some(c) if is_blank(c) => continue,
                other => return Ok(other),
            }
        }
    }

    fn read_char(&mut self) -> Result<Option<char>, ReadError> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }
        while self.pos >= self.line.len() {
            if self.exhausted {
                return Ok(None);
            }
            match self.source.read_line()? {
                Some(line) => {
                    self.line = line.chars().collect();
                    self.pos = 0;
                }
                None => {
                    self.exhausted = true;
                    self.discard_pending();
                    return Ok(None);
                }
            }
        }
        let ch = self.line[self.pos];
        self.pos += 1;
        Ok(Some(ch))
    }

    fn unread_char(&mut self, ch: char) {
        debug_assert!(self.pushback.is_none(), "only one character of pushback");
        self.pushback = Some(ch);
    }
}
