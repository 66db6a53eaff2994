//! Thin wrappers around flock(2) advisory locks.
//!
//! Locks are associated with the open file description, so two handles to
//! the same file conflict even within one process. A lock is released by
//! `unlock` or when the last descriptor for the description is closed.

use std::fs::File;
use std::io;

/// Advisory lock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockMode {
    /// Exclusive lock: conflicts with all other holders.
    Exclusive,
    /// Shared lock: conflicts only with an exclusive holder.
    Shared,
}

#[cfg(unix)]
fn flock_op(mode: LockMode, nonblocking: bool) -> i32 {
    let mut op = match mode {
        LockMode::Exclusive => libc::LOCK_EX,
        LockMode::Shared => libc::LOCK_SH,
    };
    if nonblocking {
        op |= libc::LOCK_NB;
    }
    op
}

/// Attempt the lock without blocking.
///
/// Returns `Ok(false)` when another holder conflicts, `Err` on real failures.
#[cfg(unix)]
pub(crate) fn try_lock(file: &File, mode: LockMode) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), flock_op(mode, true)) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EWOULDBLOCK => Ok(false),
        _ => Err(err),
    }
}

/// Take the lock, blocking until it is obtainable.
#[cfg(unix)]
pub(crate) fn lock(file: &File, mode: LockMode) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), flock_op(mode, false)) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Release a held lock.
#[cfg(unix)]
pub(crate) fn unlock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn try_lock(_file: &File, _mode: LockMode) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "flock advisory locks require a unix platform",
    ))
}

#[cfg(not(unix))]
pub(crate) fn lock(_file: &File, _mode: LockMode) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "flock advisory locks require a unix platform",
    ))
}

#[cfg(not(unix))]
pub(crate) fn unlock(_file: &File) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "flock advisory locks require a unix platform",
    ))
}
