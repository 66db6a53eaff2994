//! Command implementations for trawl.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod crawl;
mod init;
mod lock;
mod status;

use crate::cli::{Command, LockAction, LockCommand};
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(),
        Command::Status(args) => status::cmd_status(args),
        Command::Lock(lock_cmd) => dispatch_lock(lock_cmd),
        Command::Crawl(args) => crawl::cmd_crawl(args),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::List => lock::cmd_lock_list(),
        LockAction::Clear(args) => lock::cmd_lock_clear(args),
    }
}
