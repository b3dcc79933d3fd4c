//! The command builder: turns the token stream into one [`Command`] at a time.

use crate::command::{Command, Redirection};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token};
use crate::source::Source;
use tracing::debug;

/// Read the next command from `lexer`.
///
/// Returns `Ok(None)` when the source is exhausted before any token of a new
/// command was seen. A blank line yields a command with an empty `argv`.
/// Input that ends inside a command, or a redirection without a target, is a
/// [`ParseError`]; whatever was collected so far is dropped with it.
pub fn read_command<S: Source>(lexer: &mut Lexer<S>) -> Result<Option<Command>, ParseError> {
    let mut command = Command::default();
    let mut started = false;

    loop {
        match lexer.next_token()? {
            Token::Word(word) => command.argv.push(word),
            redirection @ Token::Redirection { fd, mode } => match lexer.next_token()? {
                Token::Word(target) => {
                    command.redirections.push(Redirection::new(fd, mode, target));
                }
                _ => {
                    return Err(ParseError::MissingRedirectTarget {
                        operator: redirection.to_string(),
                    });
                }
            },
            Token::Detach => {
                command.detached = true;
                break;
            }
            Token::Separator | Token::EndOfLine => break,
            Token::EndOfInput if !started => return Ok(None),
            Token::EndOfInput => return Err(ParseError::UnexpectedEndOfInput),
        }
        started = true;
    }

    debug!(%command, detached = command.detached, "parsed command");
    Ok(Some(command))
}
