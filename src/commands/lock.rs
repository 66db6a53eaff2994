//! Implementations of the `trawl lock` subcommands.

use crate::cli::LockClearArgs;
use crate::config::Config;
use crate::error::{Result, TrawlError};
use crate::events::{append_event, Event, EventAction};
use crate::locks::{Category, LockRegistry, StartMethod};
use serde_json::json;

/// Execute the `trawl lock list` command.
pub fn cmd_lock_list() -> Result<()> {
    let config = Config::load_or_default()?;
    let registry = LockRegistry::new(
        &config.lock_dir,
        config.lock_settings(StartMethod::Shell),
    )?;

    let statuses: Vec<_> = registry
        .status_all()
        .into_iter()
        .filter(|s| s.locked || s.pid.is_some())
        .collect();

    if statuses.is_empty() {
        println!("No lock records.");
        return Ok(());
    }

    println!("Lock records ({}):", statuses.len());
    println!();
    for status in &statuses {
        println!("  {}:", status.category);
        println!(
            "    Locked:       {}",
            if status.locked { "yes" } else { "no (record only)" }
        );
        if let Some(pid) = status.pid {
            println!("    PID:          {}", pid);
        }
        if let Some(alive) = status.process_exists {
            println!("    Owner alive:  {}", alive);
        }
        if let Some(age) = status.age_secs {
            println!("    Age:          {:.0}s", age);
        }
        if status.expired == Some(true) {
            println!(
                "    Status:       EXPIRED (exceeds {}s threshold)",
                config.lock_stale_secs
            );
        }
        if let Some(host) = &status.hostname {
            println!("    Host:         {}", host);
        }
        if let Some(command) = &status.command {
            println!("    Command:      {}", command);
        }
        if let Some(start) = &status.start_method {
            println!("    Start method: {}", start);
        }
        println!();
    }

    Ok(())
}

/// Execute the `trawl lock clear` command.
pub fn cmd_lock_clear(args: LockClearArgs) -> Result<()> {
    // Require --force: clearing a live owner's lock breaks mutual exclusion.
    if !args.force {
        return Err(TrawlError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock that a live process still holds breaks the\n\
             at-most-one-owner guarantee for its category.\n\n\
             To clear the lock, run:\n  trawl lock clear {} --force",
            args.category
        )));
    }

    let category = Category::from_str(&args.category).ok_or_else(|| {
        TrawlError::UserError(format!(
            "unknown category '{}' (expected one of: crawl, analysis, serve)",
            args.category
        ))
    })?;

    let config = Config::load_or_default()?;
    let registry = LockRegistry::new(
        &config.lock_dir,
        config.lock_settings(StartMethod::Shell),
    )?;

    // Capture the record before it is deleted, for the audit trail.
    let before = registry.manager(category).status();

    // The --force flag is the trusted-operator assertion.
    registry.force_clear(category, true)?;

    let event = Event::new(EventAction::LockClear).with_details(json!({
        "category": category.as_str(),
        "pid": before.pid,
        "age_secs": before.age_secs,
        "was_expired": before.expired,
        "was_locked": before.locked,
    }));
    if let Err(e) = append_event(&config.lock_dir, &event) {
        eprintln!("Warning: failed to log lock_clear event: {}", e);
    }

    println!("Cleared lock: {}", category);
    if let Some(pid) = before.pid {
        println!();
        println!("Previous record:");
        println!("  PID:     {}", pid);
        if let Some(age) = before.age_secs {
            println!("  Age:     {:.0}s", age);
        }
        if let Some(host) = &before.hostname {
            println!("  Host:    {}", host);
        }
        if before.expired == Some(true) {
            println!("  Status:  was EXPIRED");
        }
    }

    Ok(())
}
