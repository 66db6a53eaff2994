//! Lock record structures and utilities.
//!
//! The record stored inside a lock file is diagnostic metadata about the
//! current or last-known owner. It is *not* the source of truth for
//! ownership: that is the OS-level advisory lock held on the same file.
//! The record exists so that status queries and staleness decisions can be
//! made about an owner that may no longer be around to ask.

use crate::locks::category::Category;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// How the owning process was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StartMethod {
    /// Launched by the dashboard/web collaborator.
    Web,
    /// Launched from a shell (CLI, cron).
    #[default]
    Shell,
}

impl std::fmt::Display for StartMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartMethod::Web => write!(f, "web"),
            StartMethod::Shell => write!(f, "shell"),
        }
    }
}

/// Diagnostic payload stored in a category lock file (UTF-8 JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// Process ID of the owner.
    pub pid: u32,

    /// Category name (e.g., "crawl").
    pub process_type: String,

    /// Acquisition time, seconds since the UNIX epoch.
    pub timestamp: f64,

    /// Acquisition time, RFC3339, for humans reading the file.
    pub timestamp_formatted: String,

    /// Host the owner runs on.
    pub hostname: String,

    /// Command line of the owner.
    pub command: String,

    /// How the owner was started.
    pub start_method: StartMethod,
}

impl LockRecord {
    /// Create a record describing the current process as owner.
    pub fn new(category: Category, start_method: StartMethod) -> Self {
        let now = Utc::now();
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            pid: std::process::id(),
            process_type: category.as_str().to_string(),
            timestamp: epoch,
            timestamp_formatted: now.to_rfc3339(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            command: shell_words::join(std::env::args()),
            start_method,
        }
    }

    /// Parse a record from lock file content.
    ///
    /// Returns `None` for empty or unparsable content: both are treated
    /// identically to "no lock" by every consumer.
    pub fn parse(content: &str) -> Option<Self> {
        if content.trim().is_empty() {
            return None;
        }
        serde_json::from_str(content).ok()
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::error::TrawlError::LockError(format!("failed to serialize lock record: {}", e))
        })
    }

    /// Age of the record in seconds. Clock skew clamps to zero.
    pub fn age_secs(&self) -> f64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        (now - self.timestamp).max(0.0)
    }

    /// Whether the record is older than the staleness timeout.
    pub fn is_expired(&self, stale_secs: u64) -> bool {
        self.age_secs() > stale_secs as f64
    }

    /// Format the age as a human-readable string for status output.
    pub fn age_string(&self) -> String {
        let secs = self.age_secs() as u64;
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
