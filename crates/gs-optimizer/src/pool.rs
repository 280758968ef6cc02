//! Bounded worker pool for one evaluation pass.
//!
//! The pool is started before a pass and stopped after it. Tasks run on a
//! dedicated rayon pool; each result travels back over its own channel, so
//! completion and failure counts are derived from the collected batch rather
//! than from shared counters.

use crossbeam_channel::{bounded, Receiver};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use gs_types::{GsError, GsResult};

/// Unit of work accepted by the pool.
pub trait PoolTask: Send + 'static {
    type Output: Send + 'static;

    /// Short name used in logs and panic reports.
    fn label(&self) -> String;

    fn run(self) -> GsResult<Self::Output>;
}

/// Pending result of a submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    label: String,
    receiver: Receiver<GsResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Block until the task has finished.
    pub fn wait(self) -> GsResult<T> {
        self.receiver.recv().map_err(|_| {
            GsError::WorkerPool(format!("task {} ended without reporting a result", self.label))
        })?
    }
}

/// Results of one batch, in submission order.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub outcomes: Vec<GsResult<T>>,
    pub completed: usize,
    pub failed: usize,
}

impl<T> BatchResult<T> {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// All outputs, or the first failure in submission order.
    pub fn into_outputs(self) -> GsResult<Vec<T>> {
        self.outcomes.into_iter().collect()
    }
}

#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    slots: usize,
}

impl WorkerPool {
    pub fn start(slots: usize) -> GsResult<Self> {
        if slots == 0 {
            return Err(GsError::WorkerPool("pool needs at least one slot".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(slots)
            .thread_name(|i| format!("gs-worker-{i}"))
            .build()
            .map_err(|e| GsError::WorkerPool(format!("failed to build worker pool: {e}")))?;
        debug!(slots, "Worker pool started");
        Ok(Self { pool, slots })
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn submit<T: PoolTask>(&self, task: T) -> TaskHandle<T::Output> {
        let (sender, receiver) = bounded(1);
        let label = task.label();
        let task_label = label.clone();

        self.pool.spawn(move || {
            let result = catch_unwind(AssertUnwindSafe(|| task.run())).unwrap_or_else(|payload| {
                Err(GsError::WorkerPanicked {
                    task: task_label,
                    message: panic_message(payload.as_ref()),
                })
            });
            // receiver only goes away if the caller dropped the handle
            let _ = sender.send(result);
        });

        TaskHandle { label, receiver }
    }

    /// Submit every task, then wait for all of them, even after a failure.
    pub fn run_all<T: PoolTask>(&self, tasks: Vec<T>) -> BatchResult<T::Output> {
        let handles: Vec<_> = tasks.into_iter().map(|task| self.submit(task)).collect();

        let mut completed = 0;
        let mut failed = 0;
        let outcomes = handles
            .into_iter()
            .map(|handle| {
                let label = handle.label().to_string();
                let outcome = handle.wait();
                match &outcome {
                    Ok(_) => completed += 1,
                    Err(e) => {
                        failed += 1;
                        warn!(task = %label, "Task failed: {}", e);
                    }
                }
                outcome
            })
            .collect();

        BatchResult {
            outcomes,
            completed,
            failed,
        }
    }

    /// Shut the pool down. Worker threads exit once their queue is empty.
    pub fn stop(self) {
        debug!(slots = self.slots, "Worker pool stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    struct Square {
        n: u64,
        delay_ms: u64,
        running: Arc<Mutex<(usize, usize)>>,
    }

    impl PoolTask for Square {
        type Output = u64;

        fn label(&self) -> String {
            format!("square-{}", self.n)
        }

        fn run(self) -> GsResult<u64> {
            {
                let mut running = self.running.lock();
                running.0 += 1;
                running.1 = running.1.max(running.0);
            }
            std::thread::sleep(Duration::from_millis(self.delay_ms));
            self.running.lock().0 -= 1;

            match self.n {
                13 => Err(GsError::Model("unlucky".to_string())),
                99 => panic!("worker exploded"),
                n => Ok(n * n),
            }
        }
    }

    fn tasks(ns: &[u64], running: &Arc<Mutex<(usize, usize)>>) -> Vec<Square> {
        ns.iter()
            .map(|&n| Square {
                n,
                delay_ms: 5,
                running: Arc::clone(running),
            })
            .collect()
    }

    #[test]
    fn results_keep_submission_order() {
        let running = Arc::new(Mutex::new((0, 0)));
        let pool = WorkerPool::start(3).unwrap();
        assert_eq!(pool.slots(), 3);

        let batch = pool.run_all(tasks(&[5, 1, 4, 2, 3], &running));
        pool.stop();

        assert!(batch.is_success());
        assert_eq!(batch.completed, 5);
        assert_eq!(batch.into_outputs().unwrap(), vec![25, 1, 16, 4, 9]);
    }

    #[test]
    fn concurrency_is_bounded_by_slots() {
        let running = Arc::new(Mutex::new((0, 0)));
        let pool = WorkerPool::start(2).unwrap();
        let batch = pool.run_all(tasks(&[1, 2, 3, 4, 5, 6, 7, 8], &running));
        pool.stop();

        assert_eq!(batch.completed, 8);
        assert!(running.lock().1 <= 2);
    }

    #[test]
    fn failures_are_counted_and_first_error_wins() {
        let running = Arc::new(Mutex::new((0, 0)));
        let pool = WorkerPool::start(2).unwrap();
        let batch = pool.run_all(tasks(&[2, 13, 99, 3], &running));
        pool.stop();

        assert_eq!((batch.completed, batch.failed), (2, 2));
        assert!(matches!(batch.outcomes[2], Err(GsError::WorkerPanicked { .. })));
        assert!(matches!(batch.into_outputs(), Err(GsError::Model(_))));
    }

    #[test]
    fn panics_surface_as_errors() {
        let running = Arc::new(Mutex::new((0, 0)));
        let pool = WorkerPool::start(1).unwrap();
        let handle = pool.submit(Square {
            n: 99,
            delay_ms: 0,
            running,
        });
        match handle.wait() {
            Err(GsError::WorkerPanicked { task, message }) => {
                assert_eq!(task, "square-99");
                assert_eq!(message, "worker exploded");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn zero_slots_is_rejected() {
        assert!(matches!(WorkerPool::start(0), Err(GsError::WorkerPool(_))));
    }
}
