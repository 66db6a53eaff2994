//! Adaptive worker pool for in-process work bursts.
//!
//! The pool runs submitted tasks on a self-scaling set of worker threads,
//! bounded by a configured maximum. Tasks that represent externally
//! rate-limited calls consult the shared
//! [`RateLimiter`](crate::limiter::RateLimiter) themselves before
//! proceeding; the pool does not gate every task, which keeps it generic.
//!
//! Shutdown enqueues one sentinel per live worker so each worker dequeues
//! its own signal, then joins with a bounded timeout. A failed or panicking
//! task is logged and skipped, never fatal to its worker or the pool.

mod task;
mod worker;

#[cfg(test)]
mod tests;

// Re-export public API
pub use task::TaskOutcome;
pub use worker::{PoolMetrics, WorkerPool};
