//! Filesystem utilities for trawl.
//!
//! Atomic writes for the artifacts this core emits itself: crawl reports
//! and generated configuration.

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
