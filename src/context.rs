use std::fmt::Display;

/// Interpreter-wide settings, fixed at start-up.
///
/// Created once by the binary and passed by reference to whoever needs to know
/// how the interpreter was started.
#[derive(Debug, Clone)]
pub struct Context {
    program_name: String,
    interactive: bool,
}

impl Context {
    /// `program_name` is what error messages are prefixed with, normally `argv[0]`.
    pub fn new(program_name: impl Into<String>, interactive: bool) -> Self {
        Self {
            program_name: program_name.into(),
            interactive,
        }
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// True when reading from a terminal rather than a script or pipe.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Print `<program>: <detail>` to standard error.
    pub fn report(&self, detail: impl Display) {
        eprintln!("{}: {}", self.program_name, detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accessors() {
        let ctx = Context::new("/bin/tvsh", true);
        assert_eq!(ctx.program_name(), "/bin/tvsh");
        assert!(ctx.is_interactive());
        assert!(!Context::new("tvsh", false).is_interactive());
    }
}
