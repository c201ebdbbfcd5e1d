//! End-to-end run over a container entry
//!
//! Opens the container, resolves the entry, runs the scenario suite and the
//! optional concurrency suite, and always closes the container again, also
//! when a fatal error cut the run short.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use crate::concurrent::verify_concurrent_reads;
use crate::config::HarnessConfig;
use crate::error::{Cause, Error, Result};
use crate::formats::ZipContainer;
use crate::io::Resource;
use crate::report::{Format, SuiteReport, TextReporter};
use crate::scenario::ScenarioDriver;

fn write_error(error: io::Error) -> Error {
    Error::new(Cause::IoWrite(error.to_string()))
}

/// Runs the suites against `entry` inside the container at `path`
pub fn run_container<O: Write, E: Write>(
    path: &Path,
    entry: &str,
    config: &HarnessConfig,
    format: Format,
    out: O,
    err: E,
) -> Result<SuiteReport> {
    config.validate()?;

    let mut container = ZipContainer::open(path)?;
    let result = container
        .open_entry(entry)
        .and_then(|(info, resource)| verify_resource(Arc::new(resource), &info.name, config, format, out, err));

    container.close();

    result
}

/// Runs the suites against an already opened resource
pub fn verify_resource<R, O, E>(
    resource: Arc<R>,
    name: &str,
    config: &HarnessConfig,
    format: Format,
    mut out: O,
    mut err: E,
) -> Result<SuiteReport>
where
    R: Resource + ?Sized + 'static,
    O: Write,
    E: Write,
{
    config.validate()?;

    let size = resource.size();
    info!(entry = name, size, "verifying entry");

    let text = format == Format::Text;
    let mut reporter = TextReporter::new(&mut out, &mut err);

    if text {
        reporter.size(size).map_err(write_error)?;
    }

    let mut write_failure = None;
    let scenarios = ScenarioDriver::new(resource.as_ref(), config.chunk_size).run_all(|report| {
        if text && write_failure.is_none() {
            write_failure = reporter.scenario(report).err();
        }
    })?;
    if let Some(error) = write_failure {
        return Err(write_error(error));
    }

    if text {
        for check in &scenarios.repeatability {
            reporter.repeatability(check).map_err(write_error)?;
        }
    }

    let concurrency = if config.concurrent {
        let report = verify_concurrent_reads(Arc::clone(&resource), config)?;
        if text {
            reporter.concurrency(&report).map_err(write_error)?;
        }
        Some(report)
    } else {
        debug!("concurrency suite disabled");
        None
    };
    drop(reporter);

    let report = SuiteReport {
        entry: name.to_string(),
        size,
        scenarios,
        concurrency,
    };

    if !text {
        let json = report
            .to_json()
            .map_err(|e| Error::new(Cause::IoWrite(e.to_string())))?;
        writeln!(out, "{}", json).map_err(write_error)?;
    }

    Ok(report)
}
