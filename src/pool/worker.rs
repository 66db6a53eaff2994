//! The adaptive worker pool.
//!
//! A bounded set of long-lived worker threads pulls tasks from a shared
//! queue. The pool scales itself between an initial and a maximum thread
//! count based on backlog: every submission that finds more queued tasks
//! than active workers spawns one more, up to the maximum, and never
//! beyond it.
//!
//! Shared state (results, per-worker current-task labels, counters) is
//! guarded by its own narrow critical section; the queue itself is the
//! synchronization point between producer and consumers. There is no global
//! pool lock.

use crate::pool::task::{Task, TaskOutcome};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long an idle worker blocks on the queue before re-polling. Short so
/// shutdown is noticed promptly even when the queue is empty.
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Bounded time to wait for each worker thread during shutdown.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Point-in-time pool counters for observability.
#[derive(Debug, Clone, Copy)]
pub struct PoolMetrics {
    pub queued: usize,
    pub active_workers: usize,
    pub target_workers: usize,
    pub completed: usize,
    pub failed: usize,
}

/// State shared between the pool handle and its workers.
struct PoolShared<T> {
    accepting: AtomicBool,
    /// Worker threads currently alive.
    active: AtomicUsize,
    /// Thread count the scaling policy is aiming for.
    target: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    /// Completion-ordered successful outcomes.
    results: Mutex<Vec<TaskOutcome<T>>>,
    /// worker id -> label of the task it is currently executing.
    current: Mutex<HashMap<usize, String>>,
}

/// Self-scaling worker pool over an unbounded task queue.
pub struct WorkerPool<T: Send + 'static> {
    initial_workers: usize,
    max_workers: usize,
    tx: Sender<Task<T>>,
    rx: Receiver<Task<T>>,
    shared: Arc<PoolShared<T>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    next_worker_id: AtomicUsize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Create a pool that starts `initial_workers` threads and scales up to
    /// `max_workers` under backlog. The pool does not accept tasks until
    /// [`start`](Self::start) is called.
    pub fn new(initial_workers: usize, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        let (tx, rx) = unbounded();
        Self {
            initial_workers: initial_workers.clamp(1, max_workers),
            max_workers,
            tx,
            rx,
            shared: Arc::new(PoolShared {
                accepting: AtomicBool::new(false),
                active: AtomicUsize::new(0),
                target: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                results: Mutex::new(Vec::new()),
                current: Mutex::new(HashMap::new()),
            }),
            handles: Mutex::new(Vec::new()),
            next_worker_id: AtomicUsize::new(0),
        }
    }

    /// Spawn the initial workers and begin accepting tasks.
    pub fn start(&self) {
        self.shared.target.store(self.initial_workers, Ordering::SeqCst);
        for _ in 0..self.initial_workers {
            self.spawn_worker();
        }
        self.shared.accepting.store(true, Ordering::SeqCst);
        debug!(
            "worker pool started with {} workers (max {})",
            self.initial_workers, self.max_workers
        );
    }

    /// Submit a task. Returns `false` (and drops the task) when the pool is
    /// not accepting work.
    ///
    /// Scaling happens here: a submission that observes more queued tasks
    /// than active workers adds one worker, up to the configured maximum.
    pub fn add_task<F>(&self, label: impl Into<String>, func: F) -> bool
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let label = label.into();
        if !self.shared.accepting.load(Ordering::SeqCst) {
            warn!("pool is not accepting tasks; dropping '{}'", label);
            return false;
        }

        if self
            .tx
            .send(Task {
                func: Some(Box::new(func)),
                label,
            })
            .is_err()
        {
            return false;
        }

        let active = self.shared.active.load(Ordering::SeqCst);
        if self.tx.len() > active {
            // Claim a target slot atomically so concurrent submitters can
            // never drive the pool past its maximum.
            let claimed = self.shared.target.fetch_update(
                Ordering::SeqCst,
                Ordering::SeqCst,
                |target| (target < self.max_workers).then_some(target + 1),
            );
            if let Ok(previous) = claimed {
                debug!(
                    "backlog {} exceeds {} active workers; scaling up to {}",
                    self.tx.len(),
                    active,
                    previous + 1
                );
                self.spawn_worker();
            }
        }
        true
    }

    /// Take all successful outcomes accumulated so far, in completion order.
    pub fn take_results(&self) -> Vec<TaskOutcome<T>> {
        std::mem::take(&mut *self.shared.results.lock())
    }

    /// Number of live worker threads.
    pub fn active_workers(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Snapshot of queue/worker/outcome counters.
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            queued: self.tx.len(),
            active_workers: self.shared.active.load(Ordering::SeqCst),
            target_workers: self.shared.target.load(Ordering::SeqCst),
            completed: self.shared.completed.load(Ordering::SeqCst),
            failed: self.shared.failed.load(Ordering::SeqCst),
        }
    }

    /// Labels of tasks currently being executed, keyed by worker id.
    pub fn current_tasks(&self) -> HashMap<usize, String> {
        self.shared.current.lock().clone()
    }

    /// Shut the pool down.
    ///
    /// Marks the pool inactive, then enqueues exactly one sentinel per live
    /// worker so every worker dequeues its own shutdown signal. With
    /// `wait == false`, queued non-sentinel tasks are drained and logged as
    /// discarded (sentinels are preserved). Worker joins are bounded: a
    /// stuck worker is logged and abandoned rather than blocking shutdown
    /// forever.
    pub fn shutdown(&self, wait: bool) {
        self.shared.accepting.store(false, Ordering::SeqCst);

        let live = self.shared.active.load(Ordering::SeqCst);
        for _ in 0..live {
            let _ = self.tx.send(Task::sentinel());
        }

        if !wait {
            self.discard_pending_tasks();
        }

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!(
                    "worker '{}' did not stop within {:?}; abandoning join",
                    handle.thread().name().unwrap_or("?"),
                    JOIN_TIMEOUT
                );
            }
        }

        self.verify_queue_empty();
        debug!(
            "pool shutdown complete ({} completed, {} failed)",
            self.shared.completed.load(Ordering::SeqCst),
            self.shared.failed.load(Ordering::SeqCst)
        );
    }

    fn spawn_worker(&self) {
        let id = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
        let rx = self.rx.clone();
        let shared = Arc::clone(&self.shared);
        shared.active.fetch_add(1, Ordering::SeqCst);

        let spawned = std::thread::Builder::new()
            .name(format!("trawl-worker-{}", id))
            .spawn(move || worker_loop(id, rx, shared));

        match spawned {
            Ok(handle) => self.handles.lock().push(handle),
            Err(e) => {
                // Return the claimed slots so a later submission can retry.
                self.shared.active.fetch_sub(1, Ordering::SeqCst);
                self.shared.target.fetch_sub(1, Ordering::SeqCst);
                warn!("failed to spawn worker {}: {}", id, e);
            }
        }
    }

    /// Drain queued work without executing it, keeping shutdown sentinels.
    fn discard_pending_tasks(&self) {
        let mut sentinels = 0usize;
        let mut discarded = 0usize;
        while let Ok(task) = self.rx.try_recv() {
            if task.is_sentinel() {
                sentinels += 1;
            } else {
                discarded += 1;
                warn!("discarding queued task '{}' during shutdown", task.label);
            }
        }
        for _ in 0..sentinels {
            let _ = self.tx.send(Task::sentinel());
        }
        if discarded > 0 {
            warn!("discarded {} queued task(s) during shutdown", discarded);
        }
    }

    /// Post-join sanity check: the queue must hold no real work anymore.
    fn verify_queue_empty(&self) {
        let mut leftover = 0usize;
        while let Ok(task) = self.rx.try_recv() {
            if !task.is_sentinel() {
                leftover += 1;
                warn!(
                    "anomaly: non-sentinel task '{}' still queued after shutdown",
                    task.label
                );
            }
        }
        if leftover > 0 {
            warn!("{} task(s) were still queued after shutdown joins", leftover);
        }
    }
}

/// The long-lived worker loop.
///
/// Pulls with a short poll timeout, executes, and records the outcome. A
/// task failure (error or panic) is logged with the task label and elapsed
/// time and never propagates: the worker moves on to the next task. The
/// pool retries nothing; retry policy belongs to the task itself.
fn worker_loop<T: Send + 'static>(id: usize, rx: Receiver<Task<T>>, shared: Arc<PoolShared<T>>) {
    debug!("worker {} started", id);
    loop {
        match rx.recv_timeout(POLL_TIMEOUT) {
            Ok(task) => {
                let Some(func) = task.func else {
                    debug!("worker {} received shutdown sentinel", id);
                    break;
                };
                let label = task.label;
                shared.current.lock().insert(id, label.clone());

                let start = Instant::now();
                let outcome = catch_unwind(AssertUnwindSafe(func));
                let elapsed = start.elapsed();

                match outcome {
                    Ok(Ok(value)) => {
                        shared.completed.fetch_add(1, Ordering::SeqCst);
                        shared.results.lock().push(TaskOutcome {
                            label: label.clone(),
                            value,
                            elapsed,
                        });
                        debug!("task '{}' completed in {:.2}s", label, elapsed.as_secs_f64());
                    }
                    Ok(Err(e)) => {
                        shared.failed.fetch_add(1, Ordering::SeqCst);
                        warn!(
                            "task '{}' failed after {:.2}s: {:#}",
                            label,
                            elapsed.as_secs_f64(),
                            e
                        );
                    }
                    Err(_) => {
                        shared.failed.fetch_add(1, Ordering::SeqCst);
                        warn!(
                            "task '{}' panicked after {:.2}s",
                            label,
                            elapsed.as_secs_f64()
                        );
                    }
                }
                shared.current.lock().remove(&id);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    shared.active.fetch_sub(1, Ordering::SeqCst);
    debug!("worker {} stopped", id);
}
