//! Process liveness checks for lock staleness decisions.
//!
//! A recorded owner counts as live only if its pid exists in the process
//! table *and* is not a zombie. A terminated-but-unreaped owner can no
//! longer do work, so treating it as live would block reclamation forever.

use std::fs;

/// Check whether a process with the given pid exists.
///
/// `kill(pid, 0)` delivers no signal; it only validates the pid. EPERM means
/// the process exists but belongs to another user, which still counts.
#[cfg(unix)]
pub(crate) fn process_exists(pid: u32) -> bool {
    let rc = unsafe { libc::kill(pid as i32, 0) };
    if rc == 0 {
        return true;
    }
    matches!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(code) if code == libc::EPERM
    )
}

#[cfg(not(unix))]
pub(crate) fn process_exists(_pid: u32) -> bool {
    // Conservative fallback: assume the owner is live.
    true
}

/// Check whether the process is a zombie via `/proc/<pid>/stat`.
///
/// The state letter is the first field after the parenthesized command name;
/// the comm field may itself contain parentheses, so scan from the last `)`.
pub(crate) fn is_zombie(pid: u32) -> bool {
    let stat = match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let Some(rest) = stat.rfind(')').map(|i| &stat[i + 1..]) else {
        return false;
    };
    matches!(rest.split_whitespace().next(), Some("Z"))
}

/// A pid is live when it exists and is not a zombie.
pub(crate) fn process_is_live(pid: u32) -> bool {
    process_exists(pid) && !is_zombie(pid)
}
