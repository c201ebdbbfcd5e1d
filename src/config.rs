//! Harness configuration

use serde::Serialize;
use crate::error::{Cause, Error, Result};
use crate::types::DEFAULT_CHUNK_SIZE;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 4;

/// Work items queued per worker before clamping to the resource size
pub const DEFAULT_ITERATIONS_PER_WORKER: usize = 32;

/// Chunk reads performed by a single work item
pub const DEFAULT_READS_PER_ITEM: usize = 3;

/// Largest accepted chunk size, 64 MiB
pub const MAX_CHUNK_SIZE: usize = 64 << 20;

/// Tunables shared by the scenario driver and the concurrency verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessConfig {
    /// Bytes requested per read call
    pub chunk_size: usize,
    /// Worker threads in the concurrency pool
    pub workers: usize,
    /// Work items per worker
    pub iterations_per_worker: usize,
    /// Read+rewind cycles per work item
    pub reads_per_item: usize,
    /// Whether to run the concurrency suite after the scenarios
    pub concurrent: bool,
}

impl HarnessConfig {
    /// Checks that every tunable is usable
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::new(Cause::Argument("chunk size must be non-zero".to_string())));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::new(Cause::Argument(format!(
                "chunk size {} exceeds maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            ))));
        }
        if self.workers == 0 {
            return Err(Error::new(Cause::Argument("worker count must be non-zero".to_string())));
        }
        if self.iterations_per_worker == 0 || self.reads_per_item == 0 {
            return Err(Error::new(Cause::Argument(
                "iteration counts must be non-zero".to_string(),
            )));
        }
        Ok(())
    }

    /// Sets the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: DEFAULT_WORKERS,
            iterations_per_worker: DEFAULT_ITERATIONS_PER_WORKER,
            reads_per_item: DEFAULT_READS_PER_ITEM,
            concurrent: false,
        }
    }
}
