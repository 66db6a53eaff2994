//! Tests for crawl orchestration.

use super::*;
use crate::config::Config;
use crate::limiter::RateLimiter;
use crate::locks::{Category, LockRegistry, LockSettings};
use std::sync::Arc;
use tempfile::TempDir;

struct CountingJob {
    source: String,
}

impl SourceJob for CountingJob {
    fn run(&self, limiter: &RateLimiter) -> anyhow::Result<SourceOutcome> {
        limiter.wait();
        if self.source == "broken" {
            anyhow::bail!("simulated source failure");
        }
        Ok(SourceOutcome {
            artifacts: self.source.len() as u32,
        })
    }
}

fn counting_factory(_vendor: &str, source: &str) -> Box<dyn SourceJob> {
    Box::new(CountingJob {
        source: source.to_string(),
    })
}

fn test_locks(dir: &TempDir) -> Arc<LockRegistry> {
    Arc::new(LockRegistry::new(dir.path(), LockSettings::default()).unwrap())
}

fn test_orchestrator(locks: Arc<LockRegistry>, pairs: &[(&str, &str)]) -> Orchestrator {
    let mut jobs = JobRegistry::builtin();
    for (vendor, source) in pairs {
        jobs.register(vendor, source, counting_factory);
    }
    Orchestrator::new(locks, jobs, Arc::new(RateLimiter::new(100, 60.0)), 2)
}

fn plan(pairs: &[(&str, &str)], max_workers: usize) -> CrawlPlan {
    CrawlPlan {
        pairs: pairs
            .iter()
            .map(|(v, s)| (v.to_string(), s.to_string()))
            .collect(),
        max_workers,
    }
}

#[test]
fn plan_from_config_expands_vendor_sources() {
    let config = Config::from_yaml(
        r#"
max_workers: 3
vendors:
  - name: acme
    sources: [news, blog]
  - name: globex
    sources: [press]
"#,
    )
    .unwrap();

    let plan = CrawlPlan::from_config(&config);
    assert_eq!(plan.max_workers, 3);
    assert_eq!(plan.pairs.len(), 3);
    assert!(plan.pairs.contains(&("acme".to_string(), "news".to_string())));
    assert!(plan.pairs.contains(&("globex".to_string(), "press".to_string())));
}

#[test]
fn plan_filter_matches_vendor_source_globs() {
    let full = plan(&[("acme", "news"), ("acme", "blog"), ("globex", "press")], 2);

    let filtered = full.clone().filtered(&["acme/*".to_string()]).unwrap();
    assert_eq!(filtered.pairs.len(), 2);
    assert!(filtered.pairs.iter().all(|(v, _)| v == "acme"));

    let all = full.clone().filtered(&[]).unwrap();
    assert_eq!(all.pairs.len(), 3);

    assert!(full.filtered(&["[bad".to_string()]).is_err());
}

#[test]
fn registry_falls_back_to_generic_job() {
    let mut jobs = JobRegistry::builtin();
    jobs.register("acme", "news", counting_factory);

    assert!(jobs.has_specific("acme", "news"));
    assert!(!jobs.has_specific("acme", "blog"));

    // The unregistered pair still resolves to a runnable job.
    let limiter = RateLimiter::new(10, 60.0);
    let outcome = jobs.resolve("acme", "blog").run(&limiter).unwrap();
    assert_eq!(outcome, SourceOutcome { artifacts: 0 });

    let outcome = jobs.resolve("acme", "news").run(&limiter).unwrap();
    assert_eq!(outcome.artifacts, 4);
}

#[test]
fn pooled_run_merges_outcomes_per_vendor_and_source() {
    let dir = TempDir::new().unwrap();
    let locks = test_locks(&dir);
    let pairs = [("acme", "news"), ("acme", "blog"), ("globex", "press")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    let outcomes = orchestrator.run(&plan(&pairs, 3)).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes["acme"].len(), 2);
    assert_eq!(outcomes["acme"]["news"].artifacts, 4);
    assert_eq!(outcomes["acme"]["blog"].artifacts, 4);
    assert_eq!(outcomes["globex"]["press"].artifacts, 5);
}

#[test]
fn sequential_run_produces_the_same_shape() {
    let dir = TempDir::new().unwrap();
    let locks = test_locks(&dir);
    let pairs = [("acme", "news"), ("globex", "press")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    let outcomes = orchestrator.run(&plan(&pairs, 1)).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes["acme"]["news"].artifacts, 4);
}

#[test]
fn failing_source_is_excluded_from_outcomes() {
    let dir = TempDir::new().unwrap();
    let locks = test_locks(&dir);
    let pairs = [("acme", "news"), ("acme", "broken")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    let outcomes = orchestrator.run(&plan(&pairs, 2)).unwrap();

    assert_eq!(outcomes["acme"].len(), 1);
    assert!(outcomes["acme"].contains_key("news"));
    assert!(!outcomes["acme"].contains_key("broken"));
}

#[test]
fn contended_lock_skips_the_run_with_empty_outcomes() {
    let dir = TempDir::new().unwrap();
    let holder = test_locks(&dir);
    assert!(holder.manager(Category::Crawl).acquire().unwrap());

    let locks = test_locks(&dir);
    let pairs = [("acme", "news")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    let outcomes = orchestrator.run(&plan(&pairs, 2)).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn mutex_category_holder_also_skips_the_run() {
    let dir = TempDir::new().unwrap();
    let holder = test_locks(&dir);
    assert!(holder.manager(Category::Analysis).acquire().unwrap());

    let locks = test_locks(&dir);
    let pairs = [("acme", "news")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    let outcomes = orchestrator.run(&plan(&pairs, 2)).unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn lock_is_released_after_the_run() {
    let dir = TempDir::new().unwrap();
    let locks = test_locks(&dir);
    let pairs = [("acme", "news")];
    let orchestrator = test_orchestrator(Arc::clone(&locks), &pairs);

    orchestrator.run(&plan(&pairs, 2)).unwrap();

    // A fresh owner candidate can take the crawl lock immediately.
    let other = test_locks(&dir);
    assert!(other.manager(Category::Crawl).acquire().unwrap());
}

#[test]
fn empty_plan_still_acquires_and_releases_cleanly() {
    let dir = TempDir::new().unwrap();
    let locks = test_locks(&dir);
    let orchestrator = test_orchestrator(Arc::clone(&locks), &[]);

    let outcomes = orchestrator.run(&plan(&[], 2)).unwrap();
    assert!(outcomes.is_empty());
    assert!(!locks.manager(Category::Crawl).is_held());
}
