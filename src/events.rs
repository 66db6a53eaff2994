//! Audit event logging for trawl.
//!
//! Append-only NDJSON log (one JSON object per line) recording coordination
//! events: crawl runs starting and finishing, and forced lock clears. The
//! log lives next to the lock files so one directory tells the whole
//! coordination story for a machine.
//!
//! Appends are best-effort from the caller's perspective: commands log a
//! warning when an append fails rather than failing the operation.

use crate::error::{Result, TrawlError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A crawl run acquired its lock and started dispatching.
    CrawlStart,
    /// A crawl run finished (including empty or partially failed runs).
    CrawlFinish,
    /// A lock file was force-cleared by an operator.
    LockClear,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::CrawlStart => write!(f, "crawl_start"),
            EventAction::CrawlFinish => write!(f, "crawl_finish"),
            EventAction::LockClear => write!(f, "lock_clear"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Freeform action-specific details.
    pub details: Value,
}

impl Event {
    /// Create a new event with the current timestamp.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TrawlError::UserError(format!("failed to serialize event: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Path of the events file inside the lock directory.
pub fn events_file_path(lock_dir: &Path) -> PathBuf {
    lock_dir.join("events.ndjson")
}

/// Append an event to the events log in `lock_dir`.
pub fn append_event(lock_dir: &Path, event: &Event) -> Result<()> {
    let events_file = events_file_path(lock_dir);
    let json_line = event.to_ndjson_line()?;

    if !lock_dir.exists() {
        fs::create_dir_all(lock_dir).map_err(|e| {
            TrawlError::UserError(format!(
                "failed to create events directory '{}': {}",
                lock_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            TrawlError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        TrawlError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    // Audit entries should survive a crash that follows them.
    let _ = file.sync_all();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn event_serializes_to_single_line() {
        let event = Event::new(EventAction::CrawlStart).with_details(json!({"sources": 3}));
        let line = event.to_ndjson_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("crawl_start"));
        assert!(line.contains("\"sources\":3"));
    }

    #[test]
    fn actor_includes_host() {
        let event = Event::new(EventAction::LockClear);
        assert!(event.actor.contains('@'));
    }

    #[test]
    fn append_creates_file_and_accumulates_lines() {
        let dir = TempDir::new().unwrap();

        append_event(dir.path(), &Event::new(EventAction::CrawlStart)).unwrap();
        append_event(
            dir.path(),
            &Event::new(EventAction::CrawlFinish).with_details(json!({"artifacts": 7})),
        )
        .unwrap();

        let content = fs::read_to_string(events_file_path(dir.path())).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, EventAction::CrawlStart);

        let second: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.details["artifacts"], 7);
    }

    #[test]
    fn append_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("locks");

        append_event(&nested, &Event::new(EventAction::LockClear)).unwrap();
        assert!(events_file_path(&nested).exists());
    }
}
