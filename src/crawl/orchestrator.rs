//! The crawl orchestrator.
//!
//! Acquires the `crawl` category lock before dispatching any vendor work and
//! releases it through a drop guard, so the release happens on every exit
//! path: success, error, or panic during dispatch. On contention the run is
//! skipped with an empty outcome map; the lock manager has already logged
//! whether the cause was a same-category or a mutex-category owner.

use crate::config::Config;
use crate::crawl::vendors::{JobRegistry, SourceOutcome};
use crate::error::Result;
use crate::limiter::RateLimiter;
use crate::locks::{Category, CategoryLock, LockRegistry};
use crate::pool::WorkerPool;
use globset::{Glob, GlobSetBuilder};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Nested outcome map: vendor -> source -> outcome.
pub type CrawlOutcomes = BTreeMap<String, BTreeMap<String, SourceOutcome>>;

/// What to crawl and how wide to fan out.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    /// (vendor, source) pairs to dispatch, one task each.
    pub pairs: Vec<(String, String)>,

    /// Worker ceiling; `1` means sequential execution without the pool.
    pub max_workers: usize,
}

impl CrawlPlan {
    /// Build a plan from the configured vendor list.
    pub fn from_config(config: &Config) -> Self {
        let pairs = config
            .vendors
            .iter()
            .flat_map(|vendor| {
                vendor
                    .sources
                    .iter()
                    .map(|source| (vendor.name.clone(), source.clone()))
            })
            .collect();
        Self {
            pairs,
            max_workers: config.max_workers,
        }
    }

    /// Keep only pairs whose `vendor/source` matches one of the glob patterns.
    ///
    /// An empty pattern list keeps everything.
    pub fn filtered(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                crate::error::TrawlError::UserError(format!(
                    "invalid vendor pattern '{}': {}",
                    pattern, e
                ))
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| {
            crate::error::TrawlError::UserError(format!("invalid vendor patterns: {}", e))
        })?;

        self.pairs
            .retain(|(vendor, source)| set.is_match(format!("{}/{}", vendor, source)));
        Ok(self)
    }
}

/// Releases the category lock when dropped, whatever happened in between.
struct ReleaseGuard<'a> {
    lock: &'a CategoryLock,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release() {
            warn!("failed to release {} lock: {}", self.lock.category(), e);
        }
    }
}

/// Dispatches crawl runs under the `crawl` category lock.
pub struct Orchestrator {
    locks: Arc<LockRegistry>,
    jobs: JobRegistry,
    limiter: Arc<RateLimiter>,
    initial_workers: usize,
}

impl Orchestrator {
    pub fn new(
        locks: Arc<LockRegistry>,
        jobs: JobRegistry,
        limiter: Arc<RateLimiter>,
        initial_workers: usize,
    ) -> Self {
        Self {
            locks,
            jobs,
            limiter,
            initial_workers: initial_workers.max(1),
        }
    }

    /// Run the plan, returning the merged per-vendor outcome map.
    ///
    /// Returns an empty map when the crawl lock is contended. Task failures
    /// are logged and excluded from the map; they do not fail the run.
    pub fn run(&self, plan: &CrawlPlan) -> Result<CrawlOutcomes> {
        let lock = self.locks.manager(Category::Crawl);
        if !lock.acquire()? {
            info!("skipping crawl run: category lock is contended");
            return Ok(BTreeMap::new());
        }
        let _guard = ReleaseGuard { lock: &lock };

        info!(
            "crawl run starting: {} source(s), max {} worker(s)",
            plan.pairs.len(),
            plan.max_workers
        );

        let outcomes = if plan.max_workers > 1 {
            self.run_pooled(plan)
        } else {
            self.run_sequential(plan)
        };

        info!(
            "crawl run finished: {} of {} source(s) produced outcomes",
            outcomes.values().map(|m| m.len()).sum::<usize>(),
            plan.pairs.len()
        );
        Ok(outcomes)
    }

    /// One pool task per (vendor, source) pair.
    fn run_pooled(&self, plan: &CrawlPlan) -> CrawlOutcomes {
        let pool: WorkerPool<(String, String, SourceOutcome)> =
            WorkerPool::new(self.initial_workers.min(plan.max_workers), plan.max_workers);
        pool.start();

        for (vendor, source) in &plan.pairs {
            let job = self.jobs.resolve(vendor, source);
            let limiter = Arc::clone(&self.limiter);
            let vendor = vendor.clone();
            let source = source.clone();
            pool.add_task(format!("{}/{}", vendor, source), move || {
                let outcome = job.run(&limiter)?;
                Ok((vendor, source, outcome))
            });
        }

        pool.shutdown(true);

        let mut merged: CrawlOutcomes = BTreeMap::new();
        for result in pool.take_results() {
            let (vendor, source, outcome) = result.value;
            merged.entry(vendor).or_default().insert(source, outcome);
        }
        merged
    }

    /// Sequential dispatch for single-concurrency configurations.
    fn run_sequential(&self, plan: &CrawlPlan) -> CrawlOutcomes {
        let mut merged: CrawlOutcomes = BTreeMap::new();
        for (vendor, source) in &plan.pairs {
            let job = self.jobs.resolve(vendor, source);
            match job.run(&self.limiter) {
                Ok(outcome) => {
                    merged
                        .entry(vendor.clone())
                        .or_default()
                        .insert(source.clone(), outcome);
                }
                Err(e) => {
                    warn!("crawl of {}/{} failed: {:#}", vendor, source, e);
                }
            }
        }
        merged
    }
}
