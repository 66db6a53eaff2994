//! Locking subsystem for trawl.
//!
//! This module implements the cross-process coordination model:
//! - Per-category lock files (`trawl_<category>.lock`) guarded by OS-level
//!   exclusive advisory locks, with a JSON diagnostic record inside
//! - A declared mutual-exclusion table between categories
//! - Staleness reclamation for crashed owners (empty/corrupt/expired
//!   records, dead or zombie pids)
//! - A minimal scoped advisory lock for short critical sections
//!
//! # Lock Files
//!
//! Lock files live in a well-known shared directory, one per category,
//! named deterministically from the category identifier. The advisory lock
//! on the open descriptor is the source of truth for ownership; the record
//! inside is diagnostic. Ordinary release keeps the file on disk so the
//! last-known owner remains visible to status queries; only stale
//! reclamation and forced clearing delete it.

mod category;
mod flock;
mod liveness;
mod manager;
mod record;
mod registry;
mod scoped;


// Re-export public API
pub use category::{validate_mutex_table, Category};
pub use manager::{CategoryLock, CategoryStatus, LockSettings};
pub use record::{LockRecord, StartMethod};
pub use registry::LockRegistry;
pub use scoped::ScopedLock;
