use nix::fcntl::OFlag;
use std::fmt;
use std::os::unix::io::RawFd;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

pub const EXIT_SUCCESS: ExitCode = 0;
pub const EXIT_FAILURE: ExitCode = 1;
/// Status reported for malformed input.
pub const EXIT_SYNTAX: ExitCode = 2;

/// How a redirection target is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `<`: read from the file.
    ReadOnly,
    /// `>`: write to the file, creating or truncating it.
    WriteTruncate,
    /// `>>`: write to the end of the file, creating it if needed.
    WriteAppend,
}

impl RedirectMode {
    /// Descriptor targeted when the operator has no numeric prefix.
    pub fn default_fd(self) -> RawFd {
        match self {
            RedirectMode::ReadOnly => 0,
            RedirectMode::WriteTruncate | RedirectMode::WriteAppend => 1,
        }
    }

    pub fn operator(self) -> &'static str {
        match self {
            RedirectMode::ReadOnly => "<",
            RedirectMode::WriteTruncate => ">",
            RedirectMode::WriteAppend => ">>",
        }
    }

    /// Flags passed to `open(2)` for this mode.
    pub fn oflag(self) -> OFlag {
        match self {
            RedirectMode::ReadOnly => OFlag::O_RDONLY,
            RedirectMode::WriteTruncate => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            RedirectMode::WriteAppend => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        }
    }
}

/// A single `[n]<path`, `[n]>path` or `[n]>>path` request attached to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub fd: RawFd,
    pub mode: RedirectMode,
    pub target: String,
}

impl Redirection {
    pub fn new(fd: RawFd, mode: RedirectMode, target: impl Into<String>) -> Self {
        Self {
            fd,
            mode,
            target: target.into(),
        }
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fd != self.mode.default_fd() {
            write!(f, "{}", self.fd)?;
        }
        write!(f, "{}{}", self.mode.operator(), escape(&self.target))
    }
}

/// One executable unit produced by the command builder.
///
/// `argv[0]` names the builtin or program. An empty `argv` comes from a blank
/// line and executes as a successful no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    /// Applied in order, undone in reverse.
    pub redirections: Vec<Redirection>,
    /// Run without waiting (`&`).
    pub detached: bool,
}

impl Command {
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Prints the command in a form the lexer reads back into an equal command.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let words = self.argv.iter().map(|w| escape(w).into_owned());
        let redirections = self.redirections.iter().map(ToString::to_string);
        for part in words.chain(redirections) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(&part)?;
            first = false;
        }
        if self.detached {
            f.write_str(if first { "&" } else { " &" })?;
        }
        Ok(())
    }
}

/// Characters that end a word unless escaped.
pub(crate) fn is_special(c: char) -> bool {
    matches!(c, '&' | ';' | '<' | '>' | '\\' | '\n') || is_blank(c)
}

/// Whitespace that separates words. Newline is not blank: it ends the line.
pub(crate) fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0b' | '\x0c' | '\r')
}

/// Backslash-escape every character the lexer would otherwise treat specially.
pub(crate) fn escape(word: &str) -> std::borrow::Cow<'_, str> {
    if !word.chars().any(is_special) {
        return std::borrow::Cow::Borrowed(word);
    }
    let mut out = String::with_capacity(word.len() + 4);
    for c in word.chars() {
        if is_special(c) {
            out.push('\\');
        }
        out.push(c);
    }
    std::borrow::Cow::Owned(out)
}
