//! CLI argument parsing for trawl.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trawl: process-coordination and adaptive-concurrency core for a
/// multi-vendor content crawler.
///
/// Coordination state is plain files in a shared lock directory:
/// - One lock file per job category, guarded by an OS advisory lock
/// - A JSON record inside each lock file describing its owner
/// - An append-only NDJSON audit log alongside the lock files
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for trawl.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default trawl.yaml in the current directory.
    ///
    /// Fails if the file already exists.
    Init,

    /// Show per-category lock status.
    ///
    /// Reports, for every category: locked, owner pid, owner liveness,
    /// record age, expiry, host, command, and start method.
    Status(StatusArgs),

    /// Lock management commands.
    ///
    /// List lock records or force-clear a category's lock file.
    Lock(LockCommand),

    /// Run a crawl: acquire the crawl lock and dispatch configured sources.
    ///
    /// Skips the run (with an empty result) when the crawl lock or a
    /// mutually exclusive category is held elsewhere.
    Crawl(CrawlArgs),
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON instead of the table.
    #[arg(long)]
    pub json: bool,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// List lock records for all categories.
    List,

    /// Force-clear a category's lock file.
    ///
    /// Requires --force; this is the trusted operator path only.
    Clear(LockClearArgs),
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Category to clear (crawl, analysis, serve).
    pub category: String,

    /// Confirm the forced clear.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `crawl` command.
#[derive(Parser, Debug)]
pub struct CrawlArgs {
    /// Only crawl vendor/source pairs matching these glob patterns
    /// (e.g. "acme/*" or "*/news").
    #[arg(long, value_delimiter = ',')]
    pub vendors: Vec<String>,

    /// Override the configured worker ceiling; 1 runs sequentially.
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Write the merged outcome map as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
