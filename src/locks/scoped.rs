//! Minimal single-purpose advisory file lock.
//!
//! `ScopedLock` guards short critical sections against concurrent processes,
//! e.g. making sure a scheduled-job trigger fires once machine-wide. It is
//! intentionally dumber than the category lock manager: no record payload,
//! no staleness policy, just one file and one flock.

use crate::error::{Result, TrawlError};
use crate::locks::flock::{self, LockMode};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A single-file advisory lock.
///
/// Dropping a held lock releases it, so the lock can guard a scope and
/// survive early returns and panics inside the protected region.
#[derive(Debug)]
pub struct ScopedLock {
    path: PathBuf,
    file: Option<std::fs::File>,
}

impl ScopedLock {
    /// Create an unheld lock handle for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    /// Acquire the lock.
    ///
    /// In blocking mode, waits until the lock is obtainable. In non-blocking
    /// mode, returns `Ok(false)` immediately when another holder exists.
    /// On success the caller pid is written into the file as a diagnostic
    /// marker.
    pub fn acquire(&mut self, blocking: bool) -> Result<bool> {
        if self.file.is_some() {
            return Ok(true);
        }

        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to create lock directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to open lock file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        if blocking {
            flock::lock(&file, LockMode::Exclusive).map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to lock '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;
        } else {
            let acquired = flock::try_lock(&file, LockMode::Exclusive).map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to lock '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;
            if !acquired {
                return Ok(false);
            }
        }

        // Diagnostic marker only; ownership lives in the flock.
        file.set_len(0).ok();
        let _ = write!(file, "{}", std::process::id());
        let _ = file.flush();

        self.file = Some(file);
        Ok(true)
    }

    /// Release the lock: unlock, close, and best-effort delete the file.
    ///
    /// Idempotent: releasing an unheld lock returns `Ok(true)`. A NotFound
    /// on deletion is ignored since another releaser may have won the race.
    pub fn release(&mut self) -> Result<bool> {
        let Some(file) = self.file.take() else {
            return Ok(true);
        };

        flock::unlock(&file).map_err(|e| {
            TrawlError::LockError(format!(
                "failed to unlock '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        drop(file);

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(TrawlError::LockError(format!(
                "failed to remove lock file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Non-destructive probe: is some process holding this lock?
    ///
    /// Probes with a shared lock on a fresh descriptor so a holder (including
    /// this handle) is never disturbed.
    pub fn is_locked(&self) -> bool {
        if self.file.is_some() {
            return true;
        }
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(_) => return false,
        };
        match flock::try_lock(&file, LockMode::Shared) {
            // Shared lock obtainable means no exclusive holder; released on close.
            Ok(true) => false,
            Ok(false) => true,
            Err(_) => false,
        }
    }

    /// Whether this handle currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Run `f` while holding the lock, releasing on every exit path.
    ///
    /// Returns `Ok(None)` when the lock could not be acquired without
    /// blocking. Release happens in `Drop`, so a panic inside `f` still
    /// unlocks before unwinding continues.
    pub fn with_lock<T>(path: impl AsRef<Path>, f: impl FnOnce() -> T) -> Result<Option<T>> {
        let mut lock = ScopedLock::new(path);
        if !lock.acquire(false)? {
            return Ok(None);
        }
        let value = f();
        lock.release()?;
        Ok(Some(value))
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        if self.file.is_some()
            && let Err(e) = self.release()
        {
            log::warn!("failed to release scoped lock '{}': {}", self.path.display(), e);
        }
    }
}
