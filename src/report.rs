//! Result reporting
//!
//! Text output prints one line per check to the output stream, with the
//! diagnostic message and cause chain of failed checks on the error stream.

use std::io::{self, Write};
use serde::Serialize;
use crate::concurrent::ConcurrencyReport;
use crate::scenario::{RepeatabilityCheck, ScenarioReport, ScenarioSuite};

/// Output format of the command-line report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// One line per check as the run progresses
    #[default]
    Text,
    /// Single JSON document once the run is complete
    Json,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub entry: String,
    pub size: u64,
    pub scenarios: ScenarioSuite,
    pub concurrency: Option<ConcurrencyReport>,
}

impl SuiteReport {
    /// Number of failed scenario, repeatability and concurrency checks
    pub fn failures(&self) -> usize {
        let concurrency = self
            .concurrency
            .as_ref()
            .map_or(false, |report| !report.outcome.is_pass());
        self.scenarios.failures() + usize::from(concurrency)
    }

    /// Number of checks that ran
    pub fn checks(&self) -> usize {
        self.scenarios.reports.len() + self.scenarios.repeatability.len() + usize::from(self.concurrency.is_some())
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    /// Serializes the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes check results as text lines
pub struct TextReporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> TextReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Writes the leading size line
    pub fn size(&mut self, size: u64) -> io::Result<()> {
        writeln!(self.out, "Entry size: {} bytes", size)
    }

    pub fn scenario(&mut self, report: &ScenarioReport) -> io::Result<()> {
        if let Some(message) = &report.message {
            writeln!(self.err, "{}", message)?;
            for cause in &report.causes {
                writeln!(self.err, "  {}", cause)?;
            }
        }
        writeln!(self.out, "Testing {}\t({})", report.describe(), report.outcome)
    }

    /// Writes a line for a class whose runs disagreed; passing checks are silent
    pub fn repeatability(&mut self, check: &RepeatabilityCheck) -> io::Result<()> {
        if check.outcome.is_pass() {
            return Ok(());
        }
        writeln!(
            self.out,
            "Testing {} repeatability: first run {}, second run {}\t({})",
            check.class, check.first, check.second, check.outcome
        )
    }

    pub fn concurrency(&mut self, report: &ConcurrencyReport) -> io::Result<()> {
        if let Some(message) = &report.message {
            writeln!(self.err, "{}", message)?;
        }
        writeln!(self.out, "Testing {}\t({})", report.describe(), report.outcome)
    }

    /// Consumes the reporter and returns its streams
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fault::FaultyResource;
    use crate::io::MemoryResource;
    use crate::scenario::ScenarioDriver;
    use crate::types::{Outcome, ScenarioClass};

    fn report_for(suite: ScenarioSuite) -> SuiteReport {
        SuiteReport {
            entry: "mimetype".to_string(),
            size: 5000,
            scenarios: suite,
            concurrency: None,
        }
    }

    #[test]
    fn test_text_lines_for_passing_suite() {
        let resource = MemoryResource::new(vec![0u8; 5000]);
        let mut reporter = TextReporter::new(Vec::new(), Vec::new());
        reporter.size(5000).unwrap();

        let suite = ScenarioDriver::new(&resource, 4096)
            .run_all(|report| reporter.scenario(report).unwrap())
            .unwrap();
        for check in &suite.repeatability {
            reporter.repeatability(check).unwrap();
        }

        let (out, err) = reporter.into_inner();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Entry size: 5000 bytes");
        assert_eq!(
            lines[1],
            "Testing full-range reading buffer at offset: 0, whence: start and size: 5000\t(PASS)"
        );
        assert!(lines[1..].iter().all(|line| line.ends_with("(PASS)")));
        assert!(err.is_empty());
        assert!(report_for(suite).passed());
    }

    #[test]
    fn test_failure_writes_diagnostics() {
        let mut resource = FaultyResource::new(5000);
        resource.fail_seeks = true;
        let mut driver = ScenarioDriver::new(&resource, 4096);
        let report = driver.run_class(ScenarioClass::FullRange, 5000, 1).unwrap();

        let mut reporter = TextReporter::new(Vec::new(), Vec::new());
        reporter.scenario(&report).unwrap();

        let (out, err) = reporter.into_inner();
        assert!(String::from_utf8(out).unwrap().ends_with("(FAIL)\n"));
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "unexpected result offset: -1\n  unable to seek: injected seek failure\n"
        );
    }

    #[test]
    fn test_repeatability_line_only_on_failure() {
        let mut reporter = TextReporter::new(Vec::new(), Vec::new());
        let passing = RepeatabilityCheck {
            class: ScenarioClass::MidRange,
            first: Outcome::Pass,
            second: Outcome::Pass,
            outcome: Outcome::Pass,
        };
        let failing = RepeatabilityCheck {
            first: Outcome::Pass,
            second: Outcome::Fail,
            outcome: Outcome::Fail,
            ..passing
        };

        reporter.repeatability(&passing).unwrap();
        reporter.repeatability(&failing).unwrap();

        let (out, _) = reporter.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Testing mid-range repeatability: first run PASS, second run FAIL\t(FAIL)\n"
        );
    }

    #[test]
    fn test_json_report() {
        let resource = MemoryResource::new(vec![0u8; 5000]);
        let suite = ScenarioDriver::new(&resource, 4096).run_all(|_| {}).unwrap();
        let json = report_for(suite).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entry"], "mimetype");
        assert_eq!(value["size"], 5000);
        assert_eq!(value["scenarios"]["reports"][0]["class"], "full_range");
        assert_eq!(value["scenarios"]["reports"][4]["read_size"], 1024);
        assert_eq!(value["scenarios"]["reports"][0]["outcome"], "pass");
        assert!(value["concurrency"].is_null());
    }

    #[test]
    fn test_failed_concurrency_fails_suite() {
        use crate::concurrent::{ConcurrencyPlan, ConcurrencyReport};
        use crate::config::HarnessConfig;

        let mut report = report_for(ScenarioSuite::default());
        report.concurrency = Some(ConcurrencyReport {
            plan: ConcurrencyPlan::new(5000, &HarnessConfig::default()),
            result_offset: 4096,
            outcome: Outcome::Fail,
            message: Some("unexpected offset: 4096".to_string()),
        });

        assert!(!report.passed());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.checks(), 1);
    }
}
