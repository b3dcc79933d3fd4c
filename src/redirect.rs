//! Transactional descriptor redirection.
//!
//! [`apply`] installs a command's redirections and hands back the
//! [`SavedDescriptors`] needed to undo them. Undo happens on
//! [`SavedDescriptors::restore`] or on drop, whichever comes first, so an early
//! return anywhere between apply and restore still leaves the interpreter's
//! descriptors as they were.

use crate::command::Redirection;
use crate::error::RedirectError;
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, fcntl, open};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};
use std::os::unix::io::RawFd;
use std::path::Path;
use tracing::trace;

/// Saved copies are parked at or above this descriptor, out of the way of 0-9.
const SAVED_FD_FLOOR: RawFd = 10;

/// State of one descriptor before it was redirected.
#[derive(Debug)]
struct SavedFd {
    fd: RawFd,
    /// Close-on-exec duplicate of the original, or `None` if `fd` was closed.
    copy: Option<RawFd>,
    /// Descriptor flags of the original; `dup2` does not carry them over.
    flags: FdFlag,
}

impl SavedFd {
    fn save(fd: RawFd) -> Result<Self, Errno> {
        let flags = match fcntl(fd, FcntlArg::F_GETFD) {
            Ok(bits) => FdFlag::from_bits_truncate(bits),
            Err(Errno::EBADF) => {
                return Ok(Self {
                    fd,
                    copy: None,
                    flags: FdFlag::empty(),
                });
            }
            Err(errno) => return Err(errno),
        };
        let copy = fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(SAVED_FD_FLOOR))?;
        Ok(Self {
            fd,
            copy: Some(copy),
            flags,
        })
    }

    fn restore(self) {
        // Best effort: there is nothing useful to do if these fail.
        match self.copy {
            Some(copy) => {
                let _ = dup2(copy, self.fd);
                if !self.flags.is_empty() {
                    let _ = fcntl(self.fd, FcntlArg::F_SETFD(self.flags));
                }
                let _ = close(copy);
            }
            None => {
                let _ = close(self.fd);
            }
        }
        trace!(fd = self.fd, reopened = self.copy.is_some(), "restored descriptor");
    }
}

/// Everything needed to undo one [`apply`] call.
#[derive(Debug, Default)]
#[must_use = "dropping SavedDescriptors restores the redirected descriptors immediately"]
pub struct SavedDescriptors {
    entries: Vec<SavedFd>,
}

impl SavedDescriptors {
    /// Undo the redirections, most recent first.
    pub fn restore(mut self) {
        self.restore_all();
    }

    fn restore_all(&mut self) {
        while let Some(entry) = self.entries.pop() {
            entry.restore();
        }
    }
}

impl Drop for SavedDescriptors {
    fn drop(&mut self) {
        self.restore_all();
    }
}

/// Apply `redirections` in order.
///
/// On failure every redirection already applied is undone before the error is
/// returned, so the caller never has to clean up.
pub fn apply(redirections: &[Redirection]) -> Result<SavedDescriptors, RedirectError> {
    let mut saved = SavedDescriptors::default();
    for redirection in redirections {
        let fail = |errno| RedirectError {
            path: redirection.target.clone(),
            errno,
        };
        saved.entries.push(SavedFd::save(redirection.fd).map_err(fail)?);
        install(redirection).map_err(fail)?;
    }
    Ok(saved)
}

fn install(redirection: &Redirection) -> Result<(), Errno> {
    let opened = open(
        Path::new(&redirection.target),
        redirection.mode.oflag(),
        Mode::from_bits_truncate(0o666),
    )?;
    if opened != redirection.fd {
        let moved = dup2(opened, redirection.fd);
        let _ = close(opened);
        moved?;
    }
    trace!(
        fd = redirection.fd,
        target = %redirection.target,
        mode = redirection.mode.operator(),
        "redirected descriptor"
    );
    Ok(())
}
