//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{Result, TrawlError};
use crate::locks::{LockSettings, StartMethod};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "trawl.yaml";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            TrawlError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `trawl.yaml` if present, falling back to defaults.
    pub fn load_or_default() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| TrawlError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| TrawlError::UserError(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.lock_stale_secs == 0 {
            return Err(TrawlError::UserError(
                "config validation failed: lock_stale_secs must be greater than 0".to_string(),
            ));
        }

        if self.write_verify_attempts == 0 {
            return Err(TrawlError::UserError(
                "config validation failed: write_verify_attempts must be greater than 0"
                    .to_string(),
            ));
        }

        if self.max_workers == 0 {
            return Err(TrawlError::UserError(
                "config validation failed: max_workers must be greater than 0".to_string(),
            ));
        }

        if self.initial_workers > self.max_workers {
            return Err(TrawlError::UserError(format!(
                "config validation failed: initial_workers ({}) must not exceed max_workers ({})",
                self.initial_workers, self.max_workers
            )));
        }

        if self.rate_max_calls == 0 {
            return Err(TrawlError::UserError(
                "config validation failed: rate_max_calls must be greater than 0".to_string(),
            ));
        }

        if self.rate_window_secs <= 0.0 {
            return Err(TrawlError::UserError(
                "config validation failed: rate_window_secs must be positive".to_string(),
            ));
        }

        for vendor in &self.vendors {
            if vendor.name.is_empty() {
                return Err(TrawlError::UserError(
                    "config validation failed: vendor names must be non-empty".to_string(),
                ));
            }
            if vendor.sources.iter().any(|s| s.is_empty()) {
                return Err(TrawlError::UserError(format!(
                    "config validation failed: vendor '{}' has an empty source entry",
                    vendor.name
                )));
            }
        }

        Ok(())
    }

    /// Lock manager settings derived from this config.
    pub fn lock_settings(&self, start_method: StartMethod) -> LockSettings {
        LockSettings {
            stale_secs: self.lock_stale_secs,
            verify_attempts: self.write_verify_attempts,
            start_method,
        }
    }
}
