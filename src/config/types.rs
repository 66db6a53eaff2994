//! Configuration types and defaults for trawl.
//!
//! This module defines supporting structs, constants, and default value
//! functions used by the Config struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A vendor and the sources to crawl for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Vendor identifier (e.g., "acme").
    pub name: String,

    /// Source identifiers for this vendor (e.g., "news", "blog").
    pub sources: Vec<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

// Default value functions for serde

pub(crate) fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("trawl")
}

/// One hour. Lower values reclaim crashed owners sooner but risk reclaiming
/// a live owner that is merely slow; the pid liveness check catches most of
/// those, so this is a backstop, not the primary signal.
pub(crate) fn default_lock_stale_secs() -> u64 {
    3600
}

/// Write-and-reread attempts for persisting a lock record. Enough to ride
/// out concurrent readers without masking genuinely broken storage for long.
pub(crate) fn default_write_verify_attempts() -> u32 {
    3
}

pub(crate) fn default_initial_workers() -> usize {
    // Never above the default ceiling, which is 1 on single-core hosts.
    2usize.min(default_max_workers())
}

pub(crate) fn default_max_workers() -> usize {
    num_cpus::get().clamp(1, 8)
}

pub(crate) fn default_rate_max_calls() -> usize {
    10
}

pub(crate) fn default_rate_window_secs() -> f64 {
    60.0
}
