//! Trawl: process-coordination and adaptive-concurrency core for a
//! multi-vendor content crawler.
//!
//! This is the main entry point for the `trawl` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;
pub mod config;
pub mod crawl;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod limiter;
pub mod locks;
pub mod pool;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
