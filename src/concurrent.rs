//! Concurrent access verification
//!
//! Workers share one handle and its cursor. Every work item reads a chunk,
//! rewinds by the bytes it read and reads again, so each item advances the
//! shared cursor by exactly one chunk. Nothing here serializes the seek and
//! read pairs of different workers: whether the cursor survives that is a
//! property of the resource under test.

use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, trace, warn};
use crate::config::HarnessConfig;
use crate::error::{Cause, Error, Result, ResultExt};
use crate::io::Resource;
use crate::pool::WorkerPool;
use crate::types::{Outcome, Whence};

/// Work distribution for a resource of a given length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConcurrencyPlan {
    pub workers: usize,
    /// Work items to queue
    pub iterations: usize,
    pub chunk_size: usize,
    /// Cursor expected once every item completed
    pub expected_offset: u64,
    /// Whether the plan was cut down to the resource length
    pub clamped: bool,
    /// Length of the final partial chunk of a clamped plan, 0 if none
    pub tail: usize,
}

impl ConcurrencyPlan {
    /// Computes the plan for `length` bytes
    pub fn new(length: u64, config: &HarnessConfig) -> Self {
        let chunk = config.chunk_size.max(1) as u64;
        let iterations = config.workers.saturating_mul(config.iterations_per_worker);
        let expected_offset = (iterations as u64).saturating_mul(chunk);

        if expected_offset <= length {
            return Self {
                workers: config.workers,
                iterations,
                chunk_size: chunk as usize,
                expected_offset,
                clamped: false,
                tail: 0,
            };
        }

        Self {
            workers: config.workers,
            iterations: length.div_ceil(chunk) as usize,
            chunk_size: chunk as usize,
            expected_offset: length,
            clamped: true,
            tail: (length % chunk) as usize,
        }
    }

    /// Whether `count` is an acceptable number of bytes for one worker read
    pub fn accepts(&self, count: usize) -> bool {
        count == self.chunk_size || (self.clamped && self.tail != 0 && count == self.tail)
    }
}

/// Result of the concurrency check
#[derive(Debug, Clone, Serialize)]
pub struct ConcurrencyReport {
    pub plan: ConcurrencyPlan,
    /// Cursor read back after the pool was joined
    pub result_offset: i64,
    pub outcome: Outcome,
    pub message: Option<String>,
}

impl ConcurrencyReport {
    pub fn describe(&self) -> String {
        format!(
            "multi-threaded reading buffer at offset: 0 with {} workers and {} items",
            self.plan.workers, self.plan.iterations
        )
    }
}

/// Reads `reads` chunks at the shared cursor, rewinding between them
fn read_and_rewind<R: Resource + ?Sized>(resource: &R, plan: &ConcurrencyPlan, reads: usize) -> Result<()> {
    let mut buffer = vec![0u8; plan.chunk_size];

    for remaining in (0..reads).rev() {
        let count = resource
            .read(&mut buffer)
            .context(|| Cause::IoRead("worker chunk".to_string()))?;

        if !plan.accepts(count) {
            return Err(Error::new(Cause::IoRead(format!(
                "worker read {} of {} bytes",
                count, plan.chunk_size
            ))));
        }

        if remaining > 0 {
            resource
                .seek(-(count as i64), Whence::Current)
                .context(|| Cause::IoSeek(format!("rewind by {} bytes", count)))?;
        }
    }

    Ok(())
}

/// Runs the concurrent read check against a shared handle
///
/// Resets the cursor to 0, queues every planned work item on a pool of
/// `config.workers` threads and compares the final cursor with the plan.
/// Any failed work item is fatal; the pool is drained before it is returned.
pub fn verify_concurrent_reads<R>(resource: Arc<R>, config: &HarnessConfig) -> Result<ConcurrencyReport>
where
    R: Resource + ?Sized + 'static,
{
    config.validate()?;

    let length = resource.size();
    resource
        .seek(0, Whence::Start)
        .context(|| Cause::IoSeek("reset cursor before concurrent reads".to_string()))?;

    let plan = ConcurrencyPlan::new(length, config);
    debug!(?plan, "starting concurrent reads");

    let reads = config.reads_per_item;
    let shared = Arc::clone(&resource);
    let pool = WorkerPool::new(plan.workers, plan.iterations, move |item: usize| {
        trace!(item, "work item");
        read_and_rewind(shared.as_ref(), &plan, reads)
    })?;

    for item in 0..plan.iterations {
        if pool.has_failed() {
            debug!(queued = item, "work item failed, no further items queued");
            break;
        }
        // Dropping the pool on error still drains and joins it.
        pool.push(item)?;
    }
    pool.join()?;

    let result_offset = resource
        .current_offset()
        .context(|| Cause::Get("current offset after concurrent reads".to_string()))?;

    let mut report = ConcurrencyReport {
        plan,
        result_offset,
        outcome: Outcome::from_check(result_offset as u64 == plan.expected_offset && result_offset >= 0),
        message: None,
    };
    if !report.outcome.is_pass() {
        let message = format!("unexpected offset: {}", result_offset);
        warn!(expected = plan.expected_offset, "{}", message);
        report.message = Some(message);
    }

    Ok(report)
}
