//! seekcheck - Seek and read conformance checks for container entries
//!
//! seekcheck opens an entry inside a ZIP container as a seekable, readable
//! resource and verifies that seeking, sequential reads and offset reads
//! land where they should, including reads that overrun the end of the
//! entry. An optional concurrency check hammers one shared handle from a
//! pool of worker threads and verifies the cursor afterwards.
//!
//! # Examples
//!
//! ## Checking an entry
//!
//! ```no_run
//! use seekcheck::{HarnessConfig, ScenarioDriver, ZipContainer};
//!
//! let mut container = ZipContainer::open("book.epub")?;
//! let (info, resource) = container.open_entry("mimetype")?;
//!
//! let suite = ScenarioDriver::new(&resource, 4096).run_all(|report| {
//!     println!("{}: {}", report.describe(), report.outcome);
//! })?;
//! println!("{} passed: {}", info.name, suite.passed());
//!
//! container.close();
//! # Ok::<(), seekcheck::Error>(())
//! ```
//!
//! ## Concurrent reads on a shared handle
//!
//! ```no_run
//! use std::sync::Arc;
//! use seekcheck::{verify_concurrent_reads, HarnessConfig, MemoryResource};
//!
//! let resource = Arc::new(MemoryResource::new(vec![0u8; 1 << 20]));
//! let report = verify_concurrent_reads(resource, &HarnessConfig::default())?;
//! println!("{} -> {}", report.describe(), report.outcome);
//! # Ok::<(), seekcheck::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod config;
pub mod formats;
pub mod compression;
pub mod scenario;
pub mod pool;
pub mod concurrent;
pub mod report;
pub mod runner;

pub use error::{Cause, Error, Result, ResultExt};
pub use types::{Outcome, ReadScenario, ScenarioClass, Whence};
pub use config::HarnessConfig;
pub use io::{ChunkedReader, MappedResource, MemoryResource, Resource};
pub use formats::{EntryInfo, EntryResource, ZipContainer, DEFAULT_ENTRY_NAME};
pub use scenario::{RepeatabilityCheck, ScenarioDriver, ScenarioReport, ScenarioSuite};
pub use concurrent::{verify_concurrent_reads, ConcurrencyPlan, ConcurrencyReport};
pub use report::{Format, SuiteReport, TextReporter};
pub use runner::{run_container, verify_resource};
