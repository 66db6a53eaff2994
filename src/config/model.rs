//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the trawl coordination core.
///
/// This struct represents the contents of `trawl.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock manager settings
    // =========================================================================
    /// Directory holding the per-category lock files.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Lock records older than this many seconds are reclaimable.
    #[serde(default = "default_lock_stale_secs")]
    pub lock_stale_secs: u64,

    /// Bounded attempts for the lock-record write-and-verify loop.
    #[serde(default = "default_write_verify_attempts")]
    pub write_verify_attempts: u32,

    // =========================================================================
    // Worker pool settings
    // =========================================================================
    /// Worker threads started up front.
    #[serde(default = "default_initial_workers")]
    pub initial_workers: usize,

    /// Hard ceiling on worker threads, regardless of backlog.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    // =========================================================================
    // Rate limiter settings
    // =========================================================================
    /// Permitted calls per sliding window for rate-limited vendor work.
    #[serde(default = "default_rate_max_calls")]
    pub rate_max_calls: usize,

    /// Sliding window length in seconds.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: f64,

    // =========================================================================
    // Crawl plan
    // =========================================================================
    /// Vendors and sources to dispatch on `trawl crawl`.
    #[serde(default)]
    pub vendors: Vec<VendorConfig>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            lock_stale_secs: default_lock_stale_secs(),
            write_verify_attempts: default_write_verify_attempts(),
            initial_workers: default_initial_workers(),
            max_workers: default_max_workers(),
            rate_max_calls: default_rate_max_calls(),
            rate_window_secs: default_rate_window_secs(),
            vendors: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}
