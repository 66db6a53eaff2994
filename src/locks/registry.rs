//! Explicit per-process registry of category lock managers.
//!
//! One `CategoryLock` instance exists per category per process. The registry
//! owns them and is constructed by process startup code, then passed to the
//! consumers that need it (the orchestrator, the CLI commands) — there is no
//! ambient global. Instances are created lazily on first request and live
//! until process exit; releasing the OS lock is the only teardown required.

use crate::error::Result;
use crate::locks::category::{validate_mutex_table, Category};
use crate::locks::manager::{CategoryLock, CategoryStatus, LockSettings};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry of category lock managers for this process.
#[derive(Debug)]
pub struct LockRegistry {
    lock_dir: PathBuf,
    settings: LockSettings,
    managers: Mutex<BTreeMap<Category, Arc<CategoryLock>>>,
}

impl LockRegistry {
    /// Create a registry rooted at `lock_dir`.
    ///
    /// Validates the declared mutual-exclusion table so an asymmetric
    /// declaration fails here, deterministically, instead of showing up as
    /// order-dependent acquisition results in production.
    pub fn new<P: AsRef<Path>>(lock_dir: P, settings: LockSettings) -> Result<Self> {
        validate_mutex_table()?;
        Ok(Self {
            lock_dir: lock_dir.as_ref().to_path_buf(),
            settings,
            managers: Mutex::new(BTreeMap::new()),
        })
    }

    /// Directory holding the per-category lock files.
    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// The manager for `category`, created on first request.
    pub fn manager(&self, category: Category) -> Arc<CategoryLock> {
        let mut managers = self.managers.lock();
        managers
            .entry(category)
            .or_insert_with(|| {
                Arc::new(CategoryLock::new(category, &self.lock_dir, self.settings))
            })
            .clone()
    }

    /// Collaborator probe: is a live owner of `category` running?
    pub fn is_running(&self, category: Category) -> bool {
        self.manager(category).is_running(category)
    }

    /// Diagnostic status for every known category, without mutating any lock.
    pub fn status_all(&self) -> Vec<CategoryStatus> {
        Category::ALL
            .iter()
            .map(|&category| self.manager(category).status())
            .collect()
    }

    /// Force-clear one category's lock file. Gated on `trusted`.
    pub fn force_clear(&self, category: Category, trusted: bool) -> Result<bool> {
        self.manager(category).force_clear(trusted)
    }
}
