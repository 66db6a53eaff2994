//! Configuration model for trawl.
//!
//! This module defines the Config struct that represents `trawl.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.
//! The staleness timeout and write-verification attempt count live here
//! rather than as hard-coded constants: both are operational trade-offs.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use operations::DEFAULT_CONFIG_FILE;
pub use types::VendorConfig;
