//! Tests for the adaptive worker pool.

use super::*;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn started_pool<T: Send + 'static>(initial: usize, max: usize) -> WorkerPool<T> {
    let pool = WorkerPool::new(initial, max);
    pool.start();
    pool
}

#[test]
fn tasks_run_and_results_are_collected() {
    let pool = started_pool(2, 4);

    for i in 0..10 {
        let accepted = pool.add_task(format!("task-{}", i), move || Ok(format!("out-{}", i)));
        assert!(accepted);
    }
    pool.shutdown(true);

    let results = pool.take_results();
    assert_eq!(results.len(), 10);

    let mut values: Vec<String> = results.into_iter().map(|r| r.value).collect();
    values.sort();
    assert_eq!(values[0], "out-0");
    assert_eq!(values.len(), 10);
}

#[test]
fn add_task_requires_a_started_pool() {
    let pool: WorkerPool<String> = WorkerPool::new(1, 2);
    assert!(!pool.add_task("early", || Ok("x".to_string())));

    pool.start();
    assert!(pool.add_task("ok", || Ok("x".to_string())));

    pool.shutdown(true);
    assert!(!pool.add_task("late", || Ok("x".to_string())));
}

#[test]
fn worker_count_never_exceeds_the_maximum() {
    let pool = started_pool(1, 3);

    for i in 0..50 {
        pool.add_task(format!("task-{}", i), move || {
            std::thread::sleep(Duration::from_millis(5));
            Ok("done".to_string())
        });
        assert!(pool.active_workers() <= 3);
    }

    assert!(pool.metrics().active_workers <= 3);
    pool.shutdown(true);
    assert_eq!(pool.active_workers(), 0);
}

#[test]
#[serial]
fn backlog_scales_workers_up() {
    let pool = started_pool(1, 4);

    for i in 0..12 {
        pool.add_task(format!("slow-{}", i), move || {
            std::thread::sleep(Duration::from_millis(40));
            Ok("done".to_string())
        });
    }

    // Submissions that observed a backlog must have added workers.
    assert!(pool.active_workers() >= 2);
    assert!(pool.active_workers() <= 4);

    pool.shutdown(true);
    assert_eq!(pool.take_results().len(), 12);
}

#[test]
fn failing_task_is_excluded_and_counted_without_stopping_the_pool() {
    let pool = started_pool(2, 5);

    for i in 0..50 {
        pool.add_task(format!("task-{}", i), move || {
            if i == 7 {
                anyhow::bail!("simulated vendor failure");
            }
            Ok(format!("out-{}", i))
        });
    }
    pool.shutdown(true);

    let results = pool.take_results();
    assert_eq!(results.len(), 49);
    assert!(results.iter().all(|r| r.label != "task-7"));

    let metrics = pool.metrics();
    assert_eq!(metrics.completed, 49);
    assert_eq!(metrics.failed, 1);
}

#[test]
fn panicking_task_does_not_kill_its_worker() {
    let pool = started_pool(1, 1);

    pool.add_task("boom", || -> anyhow::Result<String> {
        panic!("task panic");
    });
    pool.add_task("after", || Ok("survived".to_string()));
    pool.shutdown(true);

    let results = pool.take_results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value, "survived");
    assert_eq!(pool.metrics().failed, 1);
}

#[test]
fn shutdown_with_wait_drains_the_queue() {
    let counter = Arc::new(AtomicUsize::new(0));
    let pool = started_pool(2, 2);

    for i in 0..20 {
        let counter = Arc::clone(&counter);
        pool.add_task(format!("task-{}", i), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    pool.shutdown(true);

    assert_eq!(counter.load(Ordering::SeqCst), 20);
    assert_eq!(pool.active_workers(), 0);
    assert_eq!(pool.metrics().queued, 0);
}

#[test]
#[serial]
fn shutdown_without_wait_discards_queued_tasks() {
    let counter = Arc::new(AtomicUsize::new(0));
    let pool = started_pool(1, 1);

    for i in 0..10 {
        let counter = Arc::clone(&counter);
        pool.add_task(format!("slow-{}", i), move || {
            std::thread::sleep(Duration::from_millis(50));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    pool.shutdown(false);

    // The single worker cannot have executed the whole queue.
    assert!(counter.load(Ordering::SeqCst) < 10);
    assert_eq!(pool.active_workers(), 0);
    assert_eq!(pool.metrics().queued, 0);
}

#[test]
#[serial]
fn current_task_labels_are_observable_while_running() {
    let pool = started_pool(1, 1);

    pool.add_task("observable", || {
        std::thread::sleep(Duration::from_millis(200));
        Ok(())
    });
    std::thread::sleep(Duration::from_millis(80));

    let current = pool.current_tasks();
    assert!(current.values().any(|label| label == "observable"));

    pool.shutdown(true);
    assert!(pool.current_tasks().is_empty());
}

#[test]
fn rate_limited_tasks_share_the_limiter() {
    use crate::limiter::RateLimiter;

    let limiter = Arc::new(RateLimiter::new(2, 0.1));
    let pool = started_pool(2, 2);
    let start = std::time::Instant::now();

    for i in 0..4 {
        let limiter = Arc::clone(&limiter);
        pool.add_task(format!("limited-{}", i), move || {
            // Externally rate-limited work gates itself on the shared limiter.
            limiter.wait();
            Ok(())
        });
    }
    pool.shutdown(true);

    assert_eq!(pool.take_results().len(), 4);
    // Four calls on a 2-per-100ms budget need at least one extra window.
    assert!(start.elapsed() >= Duration::from_millis(80));
}
