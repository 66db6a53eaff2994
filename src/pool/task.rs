//! Task and outcome types for the worker pool.

use std::time::Duration;

/// The work a task executes. `None` is the shutdown sentinel: a worker that
/// dequeues it exits instead of executing anything.
pub(crate) type TaskFn<T> = Option<Box<dyn FnOnce() -> anyhow::Result<T> + Send + 'static>>;

/// A unit of work queued for the pool.
///
/// Ownership transfers to the queue on submission; exactly one worker
/// consumes it.
pub(crate) struct Task<T> {
    pub(crate) func: TaskFn<T>,
    /// Human identifier used in logs and the per-worker observability map.
    pub(crate) label: String,
}

impl<T> Task<T> {
    pub(crate) fn sentinel() -> Self {
        Self {
            func: None,
            label: "shutdown-sentinel".to_string(),
        }
    }

    pub(crate) fn is_sentinel(&self) -> bool {
        self.func.is_none()
    }
}

/// A successfully completed task.
#[derive(Debug)]
pub struct TaskOutcome<T> {
    /// The submitted task's human identifier.
    pub label: String,
    /// Whatever the task function returned.
    pub value: T,
    /// Wall-clock execution time.
    pub elapsed: Duration,
}
