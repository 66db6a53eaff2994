//! Implementation of the `trawl crawl` command.
//!
//! Wires the coordination core together: lock registry, rate limiter, vendor
//! job registry, and orchestrator, then runs the configured crawl plan.

use crate::cli::CrawlArgs;
use crate::config::Config;
use crate::crawl::{CrawlPlan, JobRegistry, Orchestrator};
use crate::error::{Result, TrawlError};
use crate::events::{append_event, Event, EventAction};
use crate::limiter::RateLimiter;
use crate::locks::{LockRegistry, StartMethod};
use serde_json::json;
use std::sync::Arc;

/// Execute the `trawl crawl` command.
pub fn cmd_crawl(args: CrawlArgs) -> Result<()> {
    let config = Config::load_or_default()?;

    let mut plan = CrawlPlan::from_config(&config).filtered(&args.vendors)?;
    if let Some(max_workers) = args.max_workers {
        plan.max_workers = max_workers.max(1);
    }

    if plan.pairs.is_empty() {
        println!("No vendor sources configured; nothing to crawl.");
        return Ok(());
    }

    let locks = Arc::new(LockRegistry::new(
        &config.lock_dir,
        config.lock_settings(StartMethod::Shell),
    )?);
    let limiter = Arc::new(RateLimiter::new(
        config.rate_max_calls,
        config.rate_window_secs,
    ));

    let start_event = Event::new(EventAction::CrawlStart).with_details(json!({
        "sources": plan.pairs.len(),
        "max_workers": plan.max_workers,
    }));
    if let Err(e) = append_event(&config.lock_dir, &start_event) {
        eprintln!("Warning: failed to log crawl_start event: {}", e);
    }

    let orchestrator = Orchestrator::new(
        Arc::clone(&locks),
        JobRegistry::builtin(),
        limiter,
        config.initial_workers,
    );
    let outcomes = orchestrator.run(&plan)?;

    let completed: usize = outcomes.values().map(|m| m.len()).sum();
    let artifacts: u32 = outcomes
        .values()
        .flat_map(|m| m.values())
        .map(|o| o.artifacts)
        .sum();

    if completed == 0 {
        println!(
            "No outcomes produced for {} source(s): the crawl lock was contended\n\
             or every source failed. See the logs and `trawl status`.",
            plan.pairs.len()
        );
    } else {
        println!("Crawl finished: {} source(s), {} artifact(s)", completed, artifacts);
        println!();
        for (vendor, sources) in &outcomes {
            println!("  {}:", vendor);
            for (source, outcome) in sources {
                println!("    {:12} {:>4} artifact(s)", source, outcome.artifacts);
            }
        }
    }

    let finish_event = Event::new(EventAction::CrawlFinish).with_details(json!({
        "sources": plan.pairs.len(),
        "completed": completed,
        "artifacts": artifacts,
    }));
    if let Err(e) = append_event(&config.lock_dir, &finish_event) {
        eprintln!("Warning: failed to log crawl_finish event: {}", e);
    }

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&outcomes)
            .map_err(|e| TrawlError::CrawlError(format!("failed to serialize report: {}", e)))?;
        crate::fs::atomic_write_file(report, &json)?;
        println!();
        println!("Report written to {}", report.display());
    }

    Ok(())
}
