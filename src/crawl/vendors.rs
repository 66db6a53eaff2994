//! Vendor job resolution.
//!
//! Per-vendor scraping logic lives outside this core. What lives here is the
//! seam: the [`SourceJob`] trait a vendor implementation fulfills, and a
//! factory table mapping (vendor, source) pairs to constructors. Lookup is a
//! plain table of function pointers resolved at startup; an unmatched pair
//! falls back to the declared generic fetch job.

use crate::limiter::RateLimiter;
use log::info;
use serde::Serialize;
use std::collections::HashMap;

/// Result of crawling one (vendor, source) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    /// Number of artifacts (pages, documents) the job produced.
    pub artifacts: u32,
}

/// One unit of vendor work: crawl a single source.
///
/// Implementations that hit externally rate-limited endpoints must gate
/// themselves on the shared limiter before each call burst.
pub trait SourceJob: Send {
    fn run(&self, limiter: &RateLimiter) -> anyhow::Result<SourceOutcome>;
}

/// Constructor for a vendor-specific job.
pub type JobFactory = fn(vendor: &str, source: &str) -> Box<dyn SourceJob>;

/// Factory table from (vendor, source) to job constructor.
///
/// Vendor crates register their factories at process startup; anything not
/// registered resolves to [`GenericFetchJob`]. No runtime introspection is
/// involved: a factory is an ordinary function pointer.
#[derive(Default)]
pub struct JobRegistry {
    factories: HashMap<(String, String), JobFactory>,
}

impl JobRegistry {
    /// Registry with the built-in factory set.
    ///
    /// The core ships only the generic fallback; vendor-specific factories
    /// are registered by their own crates during startup wiring.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Register a factory for an exact (vendor, source) pair.
    pub fn register(&mut self, vendor: &str, source: &str, factory: JobFactory) {
        self.factories
            .insert((vendor.to_string(), source.to_string()), factory);
    }

    /// Resolve the job for a pair, falling back to the generic fetch job.
    pub fn resolve(&self, vendor: &str, source: &str) -> Box<dyn SourceJob> {
        match self
            .factories
            .get(&(vendor.to_string(), source.to_string()))
        {
            Some(factory) => factory(vendor, source),
            None => Box::new(GenericFetchJob::new(vendor, source)),
        }
    }

    /// Whether a specific (non-generic) factory exists for the pair.
    pub fn has_specific(&self, vendor: &str, source: &str) -> bool {
        self.factories
            .contains_key(&(vendor.to_string(), source.to_string()))
    }
}

/// Declared fallback when no vendor-specific job exists.
///
/// Stands in for the external scraping collaborator: it respects the rate
/// limit and reports zero artifacts, which keeps dispatch, merging, and
/// accounting exercised end to end without vendor code.
pub struct GenericFetchJob {
    vendor: String,
    source: String,
}

impl GenericFetchJob {
    pub fn new(vendor: &str, source: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            source: source.to_string(),
        }
    }
}

impl SourceJob for GenericFetchJob {
    fn run(&self, limiter: &RateLimiter) -> anyhow::Result<SourceOutcome> {
        let waited = limiter.wait();
        info!(
            "generic fetch for {}/{} (waited {:.2}s for rate budget)",
            self.vendor, self.source, waited
        );
        Ok(SourceOutcome { artifacts: 0 })
    }
}
