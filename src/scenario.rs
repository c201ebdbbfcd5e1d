//! Seek+read scenario driver
//!
//! Every scenario runs through the same steps: seek, read, compare. A seek
//! that does not land where expected fails the scenario without reading.
//! Scenarios that expect a failed seek (a negative start offset) pass on the
//! seek alone; no read is attempted.
//!
//! Mismatches are reported as [`Outcome::Fail`] and never stop the suite.
//! Errors returned by the driver are fatal for the whole run.

use serde::Serialize;
use tracing::{debug, trace, warn};
use crate::error::{Cause, Error, Result, ResultExt};
use crate::io::{ChunkedReader, Resource};
use crate::types::{Outcome, ReadScenario, ScenarioClass};

/// Consecutive runs of every scenario class
pub const RUNS_PER_CLASS: usize = 2;

/// Result of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub class: ScenarioClass,
    /// 1-based run number within the class
    pub run: usize,
    pub scenario: ReadScenario,
    pub outcome: Outcome,
    /// Seek result, or the cursor after offset reads
    pub result_offset: i64,
    /// Bytes delivered, `None` when the read was skipped
    pub read_size: Option<u64>,
    /// Cursor queried after the read, `None` when the read was skipped
    pub cursor: Option<i64>,
    /// What went wrong, for failed runs
    pub message: Option<String>,
    /// Error chain behind a failed run, outermost first
    pub causes: Vec<String>,
}

impl ScenarioReport {
    fn new(class: ScenarioClass, run: usize, scenario: ReadScenario) -> Self {
        Self {
            class,
            run,
            scenario,
            outcome: Outcome::Pass,
            result_offset: 0,
            read_size: None,
            cursor: None,
            message: None,
            causes: Vec::new(),
        }
    }

    /// Marks the run failed, keeping the error chain for display
    fn fail(mut self, message: String, error: Option<Error>) -> Self {
        warn!(class = %self.class, run = self.run, "{}", message);
        self.outcome = Outcome::Fail;
        self.message = Some(message);
        if let Some(error) = error {
            self.causes = error.backtrace().lines().map(str::to_string).collect();
        }
        self
    }

    /// Human-readable description of the scenario parameters
    pub fn describe(&self) -> String {
        let scenario = &self.scenario;
        if self.class.uses_offset_reads() {
            format!(
                "{} reading buffer at offset: {} and size: {}",
                self.class, scenario.input_offset, scenario.requested_size
            )
        } else {
            format!(
                "{} reading buffer at offset: {}, whence: {} and size: {}",
                self.class, scenario.input_offset, scenario.whence, scenario.requested_size
            )
        }
    }
}

/// Outcome of both runs of a class compared against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepeatabilityCheck {
    pub class: ScenarioClass,
    pub first: Outcome,
    pub second: Outcome,
    pub outcome: Outcome,
}

/// All scenario reports of a driver run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioSuite {
    pub reports: Vec<ScenarioReport>,
    pub repeatability: Vec<RepeatabilityCheck>,
}

impl ScenarioSuite {
    /// Number of failed scenario runs and repeatability checks
    pub fn failures(&self) -> usize {
        let scenarios = self.reports.iter().filter(|r| !r.outcome.is_pass()).count();
        let repeats = self.repeatability.iter().filter(|r| !r.outcome.is_pass()).count();
        scenarios + repeats
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }
}

/// Drops an error chain that belongs to a passing step
fn discard(error: Option<Error>) {
    if let Some(error) = error {
        trace!(error = %error, "discarding cause chain of passing step");
    }
}

/// Runs scenarios against a single resource handle
pub struct ScenarioDriver<'a, R: Resource + ?Sized> {
    resource: &'a R,
    reader: ChunkedReader,
}

impl<'a, R: Resource + ?Sized> ScenarioDriver<'a, R> {
    /// Creates a driver reading in chunks of `chunk_size` bytes
    pub fn new(resource: &'a R, chunk_size: usize) -> Self {
        Self {
            resource,
            reader: ChunkedReader::with_chunk_size(chunk_size),
        }
    }

    /// Seeks, then reads with the cursor-relative loop
    pub fn seek_and_read(&mut self, class: ScenarioClass, run: usize, scenario: ReadScenario) -> Result<ScenarioReport> {
        let report = ScenarioReport::new(class, run, scenario);
        debug!(description = %report.describe(), run, "running scenario");

        let (result_offset, seek_error) = match self.resource.seek(scenario.input_offset, scenario.whence) {
            Ok(offset) => (offset, None),
            Err(e) => (-1, Some(e)),
        };
        let mut report = ScenarioReport { result_offset, ..report };

        if result_offset != scenario.expected_offset {
            return Ok(report.fail(format!("unexpected result offset: {}", result_offset), seek_error));
        }
        discard(seek_error);

        if scenario.input_offset < 0 {
            return Ok(report);
        }

        let count = self.reader.read_buffer(self.resource, scenario.requested_size);
        report.read_size = Some(count.bytes);

        if count.bytes != scenario.expected_size {
            return Ok(report.fail(format!("unexpected read count: {}", count.bytes), count.error));
        }
        discard(count.error);

        let cursor = self
            .resource
            .current_offset()
            .context(|| Cause::Get(format!("current offset after {} scenario", class)))?;
        report.cursor = Some(cursor);

        let expected_cursor = scenario.expected_offset + scenario.expected_size as i64;
        if cursor != expected_cursor {
            return Ok(report.fail(format!("unexpected offset after read: {}", cursor), None));
        }

        Ok(report)
    }

    /// Reads with the offset-addressed loop, then checks the cursor
    pub fn read_at_offset(&mut self, class: ScenarioClass, run: usize, scenario: ReadScenario) -> Result<ScenarioReport> {
        let report = ScenarioReport::new(class, run, scenario);
        debug!(description = %report.describe(), run, "running scenario");

        let read = self
            .reader
            .read_buffer_at_offset(self.resource, scenario.input_offset, scenario.requested_size)
            .context(|| Cause::Get(format!("{} scenario", class)))?;

        let report = ScenarioReport {
            result_offset: read.cursor,
            read_size: Some(read.bytes),
            cursor: Some(read.cursor),
            ..report
        };

        if read.cursor != scenario.expected_offset {
            return Ok(report.fail(format!("unexpected offset: {}", read.cursor), read.error));
        }
        if !read.cursor_consistent() {
            return Ok(report.fail(
                format!("cursor {} does not follow read offset {}", read.cursor, read.local_offset),
                read.error,
            ));
        }
        if read.bytes != scenario.expected_size {
            return Ok(report.fail(format!("unexpected read count: {}", read.bytes), read.error));
        }
        discard(read.error);

        Ok(report)
    }

    /// Runs one scenario of `class` for a resource of `length` bytes
    pub fn run_class(&mut self, class: ScenarioClass, length: u64, run: usize) -> Result<ScenarioReport> {
        let scenario = class.scenario(length);
        if class.uses_offset_reads() {
            self.read_at_offset(class, run, scenario)
        } else {
            self.seek_and_read(class, run, scenario)
        }
    }

    /// Runs every class twice, handing each report to `observe` as it completes
    pub fn run_all<F>(&mut self, mut observe: F) -> Result<ScenarioSuite>
    where
        F: FnMut(&ScenarioReport),
    {
        let length = self.resource.size();
        if length > i64::MAX as u64 {
            return Err(Error::new(Cause::Argument(format!("resource size {} exceeds maximum", length))));
        }

        let mut suite = ScenarioSuite::default();

        for class in ScenarioClass::ALL {
            let mut outcomes = Vec::with_capacity(RUNS_PER_CLASS);

            for run in 1..=RUNS_PER_CLASS {
                let report = self.run_class(class, length, run)?;
                observe(&report);
                outcomes.push(report.outcome);
                suite.reports.push(report);
            }

            let (first, second) = (outcomes[0], outcomes[1]);
            let check = RepeatabilityCheck {
                class,
                first,
                second,
                outcome: Outcome::from_check(first == second),
            };
            if !check.outcome.is_pass() {
                warn!(class = %class, ?first, ?second, "scenario outcome changed between runs");
            }
            suite.repeatability.push(check);
        }

        Ok(suite)
    }
}
