//! Crawl orchestration.
//!
//! The orchestrator is the consumer of the coordination core: it takes the
//! `crawl` category lock, fans (vendor, source) pairs out over the worker
//! pool (or runs them sequentially at concurrency one), and merges per-task
//! outcomes into a nested vendor/source map. Vendor scraping itself is an
//! external collaborator behind the [`SourceJob`] seam.

mod orchestrator;
mod vendors;

#[cfg(test)]
mod tests;

// Re-export public API
pub use orchestrator::{CrawlOutcomes, CrawlPlan, Orchestrator};
pub use vendors::{GenericFetchJob, JobFactory, JobRegistry, SourceJob, SourceOutcome};
