//! Implementation of the `trawl init` command.

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{Result, TrawlError};
use std::path::Path;

/// Execute the `trawl init` command.
///
/// Writes a default `trawl.yaml` in the current directory. Refuses to
/// overwrite an existing file.
pub fn cmd_init() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        return Err(TrawlError::UserError(format!(
            "{} already exists; remove it first to re-initialize",
            DEFAULT_CONFIG_FILE
        )));
    }

    let config = Config::default();
    crate::fs::atomic_write_file(path, &config.to_yaml()?)?;

    println!("Wrote default configuration to {}", DEFAULT_CONFIG_FILE);
    println!("Lock directory: {}", config.lock_dir.display());
    Ok(())
}
