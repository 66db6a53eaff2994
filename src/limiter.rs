//! Sliding-window rate limiter shared by externally rate-limited tasks.
//!
//! Tracks the timestamps of recent permitted calls and makes each caller
//! wait just long enough to keep at most `max_calls` inside the trailing
//! window. The window state is one narrow critical section; the sleep
//! itself always happens outside the lock so concurrent workers can compute
//! their own wait times while one of them sleeps.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A `max_calls` per `window` budget over a sliding window.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter permitting `max_calls` per `window_secs` seconds.
    pub fn new(max_calls: usize, window_secs: f64) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window: Duration::from_secs_f64(window_secs.max(0.001)),
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Block until a call slot is available, then claim it.
    ///
    /// Returns the seconds spent waiting (`0.0` when a slot was free).
    /// Entries older than the window are pruned lazily on each access.
    pub fn wait(&self) -> f64 {
        let mut waited = Duration::ZERO;

        loop {
            let sleep_for = {
                let mut calls = self.calls.lock();
                let now = Instant::now();
                prune(&mut calls, now, self.window);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return waited.as_secs_f64();
                }

                // Window is full: wait until the oldest entry slides out.
                match calls.front() {
                    Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            // Another caller may claim the freed slot first, in which case
            // the loop computes a fresh wait against the new oldest entry.
            std::thread::sleep(sleep_for);
            waited += sleep_for;
        }
    }

    /// Fraction of the window budget currently in use, in `[0, 1]`.
    pub fn usage_ratio(&self) -> f64 {
        let mut calls = self.calls.lock();
        prune(&mut calls, Instant::now(), self.window);
        calls.len() as f64 / self.max_calls as f64
    }

    /// Number of immediately available call slots.
    pub fn available_slots(&self) -> usize {
        let mut calls = self.calls.lock();
        prune(&mut calls, Instant::now(), self.window);
        self.max_calls - calls.len()
    }
}

/// Drop timestamps that have slid out of the trailing window.
fn prune(calls: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = calls.front() {
        if now.duration_since(front) > window {
            calls.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;

    #[test]
    fn calls_under_budget_do_not_wait() {
        let limiter = RateLimiter::new(3, 60.0);

        assert_eq!(limiter.wait(), 0.0);
        assert_eq!(limiter.wait(), 0.0);
        assert_eq!(limiter.wait(), 0.0);

        assert_eq!(limiter.available_slots(), 0);
        assert!((limiter.usage_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn usage_queries_reflect_window_state() {
        let limiter = RateLimiter::new(4, 60.0);
        assert_eq!(limiter.available_slots(), 4);
        assert_eq!(limiter.usage_ratio(), 0.0);

        limiter.wait();
        limiter.wait();
        assert_eq!(limiter.available_slots(), 2);
        assert!((limiter.usage_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    #[serial]
    fn call_over_budget_waits_for_the_window() {
        let limiter = RateLimiter::new(2, 0.2);

        assert_eq!(limiter.wait(), 0.0);
        assert_eq!(limiter.wait(), 0.0);

        // Third call inside the window must wait close to the full window.
        let start = Instant::now();
        let waited = limiter.wait();
        let elapsed = start.elapsed().as_secs_f64();

        assert!(waited > 0.0);
        assert!(elapsed >= 0.1, "waited only {:.3}s", elapsed);
    }

    #[test]
    #[serial]
    fn budget_frees_up_after_the_window_passes() {
        let limiter = RateLimiter::new(1, 0.05);
        assert_eq!(limiter.wait(), 0.0);

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(limiter.available_slots(), 1);
        assert_eq!(limiter.wait(), 0.0);
    }

    #[test]
    #[serial]
    fn concurrent_callers_never_exceed_the_budget() {
        let limiter = Arc::new(RateLimiter::new(2, 0.2));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.wait())
            })
            .collect();

        let waits: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Four calls on a 2-per-200ms budget need at least one extra window.
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert!(waits.iter().filter(|&&w| w == 0.0).count() >= 2);
    }
}
