//! Per-category cross-process lock manager.
//!
//! One `CategoryLock` exists per category per process (constructed through
//! the [`LockRegistry`](crate::locks::registry::LockRegistry)). It enforces
//! at-most-one-concurrent-owner-per-category across processes on a machine,
//! plus a declared mutual-exclusion table between categories, using a lock
//! file per category as the only shared state.
//!
//! Ownership is authoritative via the OS-level exclusive advisory lock held
//! on the open descriptor. The JSON record inside the file is diagnostic
//! metadata used for staleness reclamation and status queries; it can be
//! stale, empty, or garbage after a crash, and every reader treats those
//! states as "no lock".

use crate::error::{Result, TrawlError};
use crate::locks::category::Category;
use crate::locks::flock::{self, LockMode};
use crate::locks::liveness;
use crate::locks::record::{LockRecord, StartMethod};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Tunables for the lock manager, sourced from [`Config`](crate::config::Config).
#[derive(Debug, Clone, Copy)]
pub struct LockSettings {
    /// Records older than this are reclaimable regardless of content.
    pub stale_secs: u64,
    /// Bounded attempts for the write-and-reread record persistence loop.
    pub verify_attempts: u32,
    /// Recorded in the lock file for diagnostics.
    pub start_method: StartMethod,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            stale_secs: 3600,
            verify_attempts: 3,
            start_method: StartMethod::Shell,
        }
    }
}

/// Diagnostic status of one category's lock, for operational tooling.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStatus {
    pub category: String,
    /// Whether an exclusive advisory holder currently exists.
    pub locked: bool,
    pub pid: Option<u32>,
    pub process_exists: Option<bool>,
    pub age_secs: Option<f64>,
    pub expired: Option<bool>,
    pub hostname: Option<String>,
    pub command: Option<String>,
    pub start_method: Option<String>,
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.locked && self.pid.is_none() {
            return write!(f, "{:10} unlocked", self.category);
        }
        write!(
            f,
            "{:10} {} (pid: {}, alive: {}, age: {}{}{})",
            self.category,
            if self.locked { "LOCKED" } else { "unlocked" },
            self.pid.map_or_else(|| "?".to_string(), |p| p.to_string()),
            self.process_exists
                .map_or_else(|| "?".to_string(), |b| b.to_string()),
            self.age_secs
                .map_or_else(|| "?".to_string(), |a| format!("{:.0}s", a)),
            if self.expired == Some(true) { ", EXPIRED" } else { "" },
            self.hostname
                .as_deref()
                .map_or_else(String::new, |h| format!(", host: {}", h)),
        )
    }
}

#[derive(Debug, Default)]
struct HeldState {
    /// Open descriptor holding the exclusive advisory lock, while held.
    file: Option<File>,
}

/// Cross-process lock for one job category.
#[derive(Debug)]
pub struct CategoryLock {
    category: Category,
    lock_dir: PathBuf,
    lock_path: PathBuf,
    settings: LockSettings,
    state: Mutex<HeldState>,
}

impl CategoryLock {
    pub(crate) fn new(category: Category, lock_dir: &Path, settings: LockSettings) -> Self {
        Self {
            category,
            lock_dir: lock_dir.to_path_buf(),
            lock_path: lock_dir.join(category.lock_file_name()),
            settings,
            state: Mutex::new(HeldState::default()),
        }
    }

    /// The category this manager guards.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Path of the category's lock file.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Whether this instance currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.state.lock().file.is_some()
    }

    /// Attempt to acquire the category lock. Never blocks.
    ///
    /// Returns `Ok(false)` on contention (a live owner of this category or
    /// of a declared mutex partner exists). Stale artifacts from crashed
    /// owners are reclaimed on the way. The only error path is a lock
    /// record that cannot be persisted and verified.
    pub fn acquire(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if state.file.is_some() {
            return Ok(true);
        }

        // Self-check: never override a live owner of our own category.
        if self.probe_running(self.category, &state) {
            warn!(
                "{} lock unavailable: another {} owner is live{}",
                self.category,
                self.category,
                self.owner_context()
            );
            return Ok(false);
        }

        // Mutex check: conflicting categories must not be running.
        for partner in self.category.conflicts_with() {
            if self.probe_running(*partner, &state) {
                warn!(
                    "{} lock unavailable: mutually exclusive category {} is running",
                    self.category, partner
                );
                return Ok(false);
            }
        }

        // A crashed owner must never permanently block acquisition.
        self.reclaim_stale()?;

        if !self.lock_dir.exists() {
            fs::create_dir_all(&self.lock_dir).map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to create lock directory '{}': {}",
                    self.lock_dir.display(),
                    e
                ))
            })?;
        }

        // Open without truncating: never destroy a record before holding the lock.
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                TrawlError::LockError(format!(
                    "failed to open lock file '{}': {}",
                    self.lock_path.display(),
                    e
                ))
            })?;

        let acquired = flock::try_lock(&file, LockMode::Exclusive).map_err(|e| {
            TrawlError::LockError(format!(
                "flock on '{}' failed: {}",
                self.lock_path.display(),
                e
            ))
        })?;
        if !acquired {
            warn!(
                "{} lock unavailable: exclusive holder appeared during acquisition",
                self.category
            );
            return Ok(false);
        }

        let record = LockRecord::new(self.category, self.settings.start_method);
        self.write_record_verified(&mut file, &record)?;

        info!(
            "acquired {} lock (pid {}, {})",
            self.category, record.pid, record.timestamp_formatted
        );
        state.file = Some(file);
        Ok(true)
    }

    /// Release the lock.
    ///
    /// Idempotent: releasing when not held is a no-op returning `Ok(true)`.
    /// The lock file is intentionally left in place so the last-known
    /// record remains available for status and audit queries.
    pub fn release(&self) -> Result<bool> {
        let mut state = self.state.lock();
        let Some(file) = state.file.take() else {
            return Ok(true);
        };

        let result = flock::unlock(&file);
        drop(file);
        if let Err(e) = result {
            // The descriptor is closed either way, which drops the lock.
            warn!("unlock of {} lock reported: {}", self.category, e);
        }
        info!("released {} lock", self.category);
        Ok(true)
    }

    /// Is a live owner of `category` currently running?
    ///
    /// This is the collaborator-facing "is it safe for me to proceed" probe.
    pub fn is_running(&self, category: Category) -> bool {
        let state = self.state.lock();
        self.probe_running(category, &state)
    }

    /// Unconditionally delete the category's lock file.
    ///
    /// Refuses unless the caller asserts it is a trusted operator path
    /// (admin command, health-check remediation). Never called from
    /// ordinary business logic.
    pub fn force_clear(&self, trusted: bool) -> Result<bool> {
        if !trusted {
            warn!(
                "refusing to force-clear {} lock: caller is not a trusted operator path",
                self.category
            );
            return Ok(false);
        }

        {
            let mut state = self.state.lock();
            if let Some(file) = state.file.take() {
                let _ = flock::unlock(&file);
            }
        }

        match fs::remove_file(&self.lock_path) {
            Ok(()) => {
                warn!("force-cleared {} lock file", self.category);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(TrawlError::LockError(format!(
                "failed to force-clear '{}': {}",
                self.lock_path.display(),
                e
            ))),
        }
    }

    /// Diagnostic status for this category, without mutating any lock.
    pub fn status(&self) -> CategoryStatus {
        let locked = self.exclusive_holder_exists();
        let record = fs::read_to_string(&self.lock_path)
            .ok()
            .and_then(|c| LockRecord::parse(&c));

        match record {
            Some(r) => CategoryStatus {
                category: self.category.as_str().to_string(),
                locked,
                pid: Some(r.pid),
                process_exists: Some(liveness::process_is_live(r.pid)),
                age_secs: Some(r.age_secs()),
                expired: Some(r.is_expired(self.settings.stale_secs)),
                hostname: Some(r.hostname),
                command: Some(r.command),
                start_method: Some(r.start_method.to_string()),
            },
            None => CategoryStatus {
                category: self.category.as_str().to_string(),
                locked,
                pid: None,
                process_exists: None,
                age_secs: None,
                expired: None,
                hostname: None,
                command: None,
                start_method: None,
            },
        }
    }

    /// Liveness determination for one category's lock file.
    ///
    /// The shared-flock probe alone cannot detect a crashed-but-unreaped
    /// holder on every platform, so its verdict is cross-checked against the
    /// recorded timestamp and OS process-table liveness. A category checking
    /// itself while holding its own lock reports "not running" so mutual
    /// checks cannot self-deadlock.
    fn probe_running(&self, category: Category, state: &HeldState) -> bool {
        if category == self.category && state.file.is_some() {
            return false;
        }

        let path = self.lock_dir.join(category.lock_file_name());
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return false,
        };

        // Empty or unparsable content is identical to "no lock".
        let Some(record) = LockRecord::parse(&content) else {
            return false;
        };
        if record.is_expired(self.settings.stale_secs) {
            debug!(
                "{} lock record expired ({}); treating as not running",
                category,
                record.age_string()
            );
            return false;
        }
        if !liveness::process_is_live(record.pid) {
            debug!(
                "{} lock owner pid {} is dead or a zombie; treating as not running",
                category, record.pid
            );
            return false;
        }

        shared_probe(&path)
    }

    /// Shared-probe result for our own path, ignoring record cross-checks.
    fn exclusive_holder_exists(&self) -> bool {
        shared_probe(&self.lock_path)
    }

    /// Delete the lock file when its record is reclaimable.
    ///
    /// Runs even when the OS-level lock is technically unheld: a
    /// parseable-but-stale record is cleaned either way.
    fn reclaim_stale(&self) -> Result<()> {
        let content = match fs::read_to_string(&self.lock_path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(TrawlError::LockError(format!(
                    "failed to read lock file '{}': {}",
                    self.lock_path.display(),
                    e
                )));
            }
        };

        let reason = match LockRecord::parse(&content) {
            None => Some("empty or unparsable record".to_string()),
            Some(r) if r.is_expired(self.settings.stale_secs) => Some(format!(
                "record expired ({} old, pid {})",
                r.age_string(),
                r.pid
            )),
            Some(r) if !liveness::process_is_live(r.pid) => {
                Some(format!("owner pid {} is dead or a zombie", r.pid))
            }
            Some(_) => None,
        };

        if let Some(reason) = reason {
            warn!("reclaiming stale {} lock file: {}", self.category, reason);
            match fs::remove_file(&self.lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(TrawlError::LockError(format!(
                        "failed to remove stale lock file '{}': {}",
                        self.lock_path.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }

    /// Persist the lock record through the held descriptor.
    ///
    /// Writes, flushes, syncs, then re-reads the file to confirm the content
    /// round-trips, retrying up to `verify_attempts` times. Exhaustion is
    /// fatal for the acquisition: an unverifiable record means the
    /// coordination metadata cannot be trusted.
    fn write_record_verified(&self, file: &mut File, record: &LockRecord) -> Result<()> {
        let json = record.to_json()?;
        let attempts = self.settings.verify_attempts.max(1);

        for attempt in 1..=attempts {
            let wrote = (|| -> std::io::Result<()> {
                file.seek(SeekFrom::Start(0))?;
                file.write_all(json.as_bytes())?;
                // Trim stale trailing bytes from a previous, longer record.
                file.set_len(json.len() as u64)?;
                file.flush()?;
                file.sync_all()?;
                Ok(())
            })();

            match wrote {
                Ok(()) => match fs::read_to_string(&self.lock_path) {
                    Ok(back) if back == json => return Ok(()),
                    Ok(_) => debug!(
                        "{} lock record re-read mismatch on attempt {}/{}",
                        self.category, attempt, attempts
                    ),
                    Err(e) => debug!(
                        "{} lock record re-read failed on attempt {}/{}: {}",
                        self.category, attempt, attempts, e
                    ),
                },
                Err(e) => debug!(
                    "{} lock record write failed on attempt {}/{}: {}",
                    self.category, attempt, attempts, e
                ),
            }
        }

        Err(TrawlError::LockPersist(format!(
            "could not verify {} lock record at '{}' after {} attempts",
            self.category,
            self.lock_path.display(),
            attempts
        )))
    }

    /// Best-effort owner description for contention log lines.
    fn owner_context(&self) -> String {
        fs::read_to_string(&self.lock_path)
            .ok()
            .and_then(|c| LockRecord::parse(&c))
            .map(|r| {
                format!(
                    " (pid {}, {} old, host {})",
                    r.pid,
                    r.age_string(),
                    r.hostname
                )
            })
            .unwrap_or_default()
    }
}

impl Drop for CategoryLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the OS lock; nothing else to do.
        if let Some(file) = self.state.lock().file.take() {
            let _ = flock::unlock(&file);
        }
    }
}

/// Probe a path with a non-blocking shared lock on a fresh descriptor.
///
/// Obtaining the shared lock means no exclusive holder exists. The probe
/// descriptor is closed immediately, releasing the shared lock.
fn shared_probe(path: &Path) -> bool {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    match flock::try_lock(&file, LockMode::Shared) {
        Ok(true) => {
            let _ = flock::unlock(&file);
            false
        }
        Ok(false) => true,
        Err(_) => false,
    }
}
