//! Fixed-size worker pool with a bounded work queue
//!
//! Workers are long-running jobs on a dedicated rayon pool that pull items
//! from a bounded crossbeam channel. Joining closes the queue and blocks on
//! a wait group until every worker has returned. After the first failed item
//! the remaining queued items are drained without being run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};
use crate::error::{Cause, Error, Result};

/// Counters reported by a joined pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Items run to completion
    pub completed: usize,
    /// Items dequeued after a failure and never run
    pub skipped: usize,
}

#[derive(Default)]
struct PoolState {
    failed: AtomicBool,
    failure: Mutex<Option<Error>>,
    completed: AtomicUsize,
    skipped: AtomicUsize,
}

impl PoolState {
    /// Keeps the first failure only
    fn record(&self, error: Error) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            *failure = Some(error);
        }
        self.failed.store(true, Ordering::Release);
    }
}

/// Pool of `workers` threads running a callback on queued items
pub struct WorkerPool<T: Send + 'static> {
    // Dropped after the workers are joined
    _pool: ThreadPool,
    sender: Option<Sender<T>>,
    wait_group: Option<WaitGroup>,
    state: Arc<PoolState>,
    capacity: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates the pool and starts its workers
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads
    /// * `capacity` - Maximum number of queued items
    /// * `callback` - Work run for every item
    pub fn new<F>(workers: usize, capacity: usize, callback: F) -> Result<Self>
    where
        F: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(Error::new(Cause::Argument("worker count must be non-zero".to_string()))
                .context(Cause::PoolInitialize(format!("{} workers", workers))));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("seekcheck-worker-{}", index))
            .build()
            .map_err(|e| Error::new(Cause::PoolInitialize(e.to_string())))?;

        let (sender, receiver) = bounded(capacity);
        let state = Arc::new(PoolState::default());
        let callback = Arc::new(callback);
        let wait_group = WaitGroup::new();

        for worker in 0..workers {
            let receiver = receiver.clone();
            let state = Arc::clone(&state);
            let callback = Arc::clone(&callback);
            let wait_group = wait_group.clone();

            pool.spawn(move || {
                run_worker(worker, &receiver, callback.as_ref(), &state);
                drop(wait_group);
            });
        }
        debug!(workers, capacity, "worker pool started");

        Ok(Self {
            _pool: pool,
            sender: Some(sender),
            wait_group: Some(wait_group),
            state,
            capacity,
        })
    }

    /// Queues an item without blocking
    pub fn push(&self, item: T) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::new(Cause::Append("pool already joined".to_string())))?;

        sender.try_send(item).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => format!("queue full at {} items", self.capacity),
                TrySendError::Disconnected(_) => "no workers left".to_string(),
            };
            Error::new(Cause::Append(reason))
        })
    }

    /// Whether an item has failed so far
    pub fn has_failed(&self) -> bool {
        self.state.failed.load(Ordering::Acquire)
    }

    /// Closes the queue and waits for every worker to return
    fn drain(&mut self) {
        drop(self.sender.take());
        if let Some(wait_group) = self.wait_group.take() {
            wait_group.wait();
        }
    }

    /// Drains the pool and returns the first item failure, if any
    pub fn join(mut self) -> Result<PoolStats> {
        self.drain();

        let stats = PoolStats {
            completed: self.state.completed.load(Ordering::Acquire),
            skipped: self.state.skipped.load(Ordering::Acquire),
        };
        debug!(completed = stats.completed, skipped = stats.skipped, "worker pool joined");

        match self.state.failure.lock().take() {
            Some(error) => Err(error.context(Cause::PoolFinalize(format!(
                "work item failed, {} completed, {} skipped",
                stats.completed, stats.skipped
            )))),
            None => Ok(stats),
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.drain();
    }
}

fn run_worker<T, F>(worker: usize, receiver: &Receiver<T>, callback: &F, state: &PoolState)
where
    F: Fn(T) -> Result<()>,
{
    for item in receiver.iter() {
        if state.failed.load(Ordering::Acquire) {
            state.skipped.fetch_add(1, Ordering::AcqRel);
            continue;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| callback(item))) {
            Ok(Ok(())) => {
                state.completed.fetch_add(1, Ordering::AcqRel);
            }
            Ok(Err(error)) => {
                debug!(worker, error = %error, "work item failed");
                state.record(error);
            }
            Err(_) => {
                state.record(Error::new(Cause::PoolFinalize(format!("worker {} panicked", worker))));
            }
        }
    }
    trace!(worker, "worker finished");
}
