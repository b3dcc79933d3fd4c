//! Interrupt and quit dispositions for the interpreter and the processes it starts.
//!
//! An interactive interpreter must survive Ctrl-C and Ctrl-\ while the
//! foreground child it is waiting for does not. Dispositions set to "ignore"
//! survive `exec`, which is what keeps detached children immune too.

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

fn set_disposition(signal: Signal, handler: SigHandler) -> nix::Result<()> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // Only SIG_IGN and SIG_DFL are ever installed, never a Rust handler.
    unsafe { sigaction(signal, &action) }.map(drop)
}

/// Dispositions of the interpreter process itself, installed once at start-up.
///
/// Interactive: interrupt and quit are ignored. Otherwise only quit is ignored.
pub fn install_interpreter(interactive: bool) -> nix::Result<()> {
    if interactive {
        set_disposition(Signal::SIGINT, SigHandler::SigIgn)?;
    }
    set_disposition(Signal::SIGQUIT, SigHandler::SigIgn)
}

/// Dispositions for a freshly forked child, applied before it execs.
///
/// Runs in the child, so failures are ignored: the program still runs, with
/// the interpreter's dispositions.
pub fn prepare_child(interactive: bool, detached: bool) {
    let (interrupt, quit) = match (interactive, detached) {
        (_, true) => (Some(SigHandler::SigIgn), SigHandler::SigIgn),
        (true, false) => (Some(SigHandler::SigDfl), SigHandler::SigDfl),
        (false, false) => (None, SigHandler::SigDfl),
    };
    if let Some(handler) = interrupt {
        let _ = set_disposition(Signal::SIGINT, handler);
    }
    let _ = set_disposition(Signal::SIGQUIT, quit);
}

/// Reset dispositions before the interpreter replaces itself with `exec`.
pub fn prepare_exec(interactive: bool) {
    if interactive {
        let _ = set_disposition(Signal::SIGINT, SigHandler::SigDfl);
        let _ = set_disposition(Signal::SIGQUIT, SigHandler::SigDfl);
    }
}
