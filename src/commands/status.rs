//! Implementation of the `trawl status` command.
//!
//! Displays per-category lock status: holder pid, liveness, record age,
//! expiry, host, and start method. Never mutates any lock.

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::{Result, TrawlError};
use crate::locks::{LockRegistry, StartMethod};

/// Execute the `trawl status` command.
pub fn cmd_status(args: StatusArgs) -> Result<()> {
    let config = Config::load_or_default()?;
    let registry = LockRegistry::new(
        &config.lock_dir,
        config.lock_settings(StartMethod::Shell),
    )?;

    let statuses = registry.status_all();

    if args.json {
        let json = serde_json::to_string_pretty(&statuses)
            .map_err(|e| TrawlError::UserError(format!("failed to serialize status: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("Category Locks ({})", config.lock_dir.display());
    println!("==============");
    println!();
    for status in &statuses {
        println!("  {}", status);
    }
    println!();

    let expired: Vec<&str> = statuses
        .iter()
        .filter(|s| s.expired == Some(true))
        .map(|s| s.category.as_str())
        .collect();
    if !expired.is_empty() {
        println!(
            "Note: {} expired record(s): {}. A future acquisition will reclaim them,\n\
             or use `trawl lock clear <category> --force`.",
            expired.len(),
            expired.join(", ")
        );
    }

    Ok(())
}
