//! Launching external programs: fork, exec through the search path, wait.

use crate::command::ExitCode;
use crate::signals;
use nix::errno::Errno;
use nix::libc::c_char;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork, write};
use std::ffi::{CStr, CString, NulError};
use std::io::{self, Write};
use std::ptr;
use tracing::{debug, warn};

/// Exit status of a child whose program could not be found.
pub const EXIT_NOT_FOUND: ExitCode = 127;
/// Exit status of a child whose program was found but could not be executed.
pub const EXIT_NOT_EXECUTABLE: ExitCode = 126;

/// Convert an argument vector into the C strings `execvp` needs.
pub fn to_c_argv(argv: &[String]) -> Result<Vec<CString>, NulError> {
    argv.iter().map(|arg| CString::new(arg.as_bytes())).collect()
}

/// Fork and exec `argv` in the child.
///
/// `program_name` prefixes the message the child prints when exec fails.
/// Everything the child needs is built here, before the fork: between fork
/// and exec the child neither allocates nor takes locks.
pub fn spawn(
    program_name: &str,
    argv: &[CString],
    interactive: bool,
    detached: bool,
) -> Result<Pid, Errno> {
    let program = argv.first().ok_or(Errno::EINVAL)?;
    let prefix = format!("{}: {}: ", program_name, program.to_string_lossy());
    let mut pointers: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
    pointers.push(ptr::null());

    // Anything still buffered would otherwise be written twice.
    let _ = io::stdout().flush();

    // The child only touches signal dispositions and then execs or exits.
    match unsafe { fork() }? {
        ForkResult::Child => {
            signals::prepare_child(interactive, detached);
            // `pointers` is NULL-terminated and borrows from `argv`, alive here.
            unsafe { nix::libc::execvp(program.as_ptr(), pointers.as_ptr()) };
            child_failed(prefix.as_bytes(), Errno::last())
        }
        ForkResult::Parent { child } => {
            debug!(pid = child.as_raw(), detached, "spawned child");
            Ok(child)
        }
    }
}

/// Replace the current process image. Only returns on failure.
pub fn exec(program: &CStr, argv: &[CString]) -> Errno {
    match execvp(program, argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    }
}

/// Report an exec failure from inside the child and terminate it.
fn child_failed(prefix: &[u8], errno: Errno) -> ! {
    let stderr = io::stderr();
    for part in [prefix, errno.desc().as_bytes(), &b"\n"[..]] {
        let _ = write(&stderr, part);
    }
    let code = if errno == Errno::ENOENT {
        EXIT_NOT_FOUND
    } else {
        EXIT_NOT_EXECUTABLE
    };
    // Skip the parent's exit handlers and buffered output.
    unsafe { nix::libc::_exit(code) }
}

/// Block until `child` terminates and return its exit status.
///
/// Only `child` is waited for; other children that finish meanwhile are left
/// alone. A child killed by a signal reports `128 + signal`.
pub fn wait_for(child: Pid) -> Result<ExitCode, Errno> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(pid = child.as_raw(), code, "child exited");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(pid = child.as_raw(), %signal, "child killed");
                return Ok(terminated_by_signal(signal));
            }
            Ok(other) => warn!(?other, "unexpected wait status"),
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(errno),
        }
    }
}

fn terminated_by_signal(signal: Signal) -> ExitCode {
    128 + signal as ExitCode
}
