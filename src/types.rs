//! Core data types for seekcheck

use std::fmt;
use serde::Serialize;

/// Default chunk size for bounded reads
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Offset from the end of the resource used by the tail-overrun scenario
pub const TAIL_OFFSET: u64 = 1024;

/// Read size requested by the tail-overrun scenario
pub const TAIL_READ_SIZE: u64 = 4096;

/// Reference point for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Whence {
    /// Relative to the start of the resource
    Start,
    /// Relative to the current cursor
    Current,
    /// Relative to the end of the resource
    End,
}

impl Whence {
    /// Returns the name of this reference point
    pub fn name(&self) -> &'static str {
        match self {
            Whence::Start => "start",
            Whence::Current => "current",
            Whence::End => "end",
        }
    }
}

impl fmt::Display for Whence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One seek+read test case with expected outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadScenario {
    /// Offset passed to the seek
    pub input_offset: i64,
    /// Reference point of the seek
    pub whence: Whence,
    /// Number of bytes to read after the seek
    pub requested_size: u64,
    /// Offset the seek must return, -1 when the seek must fail
    pub expected_offset: i64,
    /// Number of bytes the read must deliver
    pub expected_size: u64,
}

impl ReadScenario {
    /// Creates a start-relative scenario
    pub fn from_start(input_offset: i64, requested_size: u64, expected_offset: i64, expected_size: u64) -> Self {
        Self {
            input_offset,
            whence: Whence::Start,
            requested_size,
            expected_offset,
            expected_size,
        }
    }
}

/// Non-fatal result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    /// Maps a boolean check onto an outcome
    pub fn from_check(passed: bool) -> Self {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => f.write_str("PASS"),
            Outcome::Fail => f.write_str("FAIL"),
        }
    }
}

/// Scenario classes run by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioClass {
    /// Whole resource from offset 0
    FullRange,
    /// Half the resource from one seventh in
    MidRange,
    /// Read running past the end of the resource
    TailOverrun,
    /// Mid-range through offset-addressed reads
    OffsetMidRange,
}

impl ScenarioClass {
    /// All classes in the order the driver runs them
    pub const ALL: [ScenarioClass; 4] = [
        ScenarioClass::FullRange,
        ScenarioClass::MidRange,
        ScenarioClass::TailOverrun,
        ScenarioClass::OffsetMidRange,
    ];

    /// Returns the name of this class
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioClass::FullRange => "full-range",
            ScenarioClass::MidRange => "mid-range",
            ScenarioClass::TailOverrun => "tail-overrun",
            ScenarioClass::OffsetMidRange => "offset-mid-range",
        }
    }

    /// Whether this class reads through explicit offsets instead of the cursor
    pub fn uses_offset_reads(&self) -> bool {
        matches!(self, ScenarioClass::OffsetMidRange)
    }

    /// Builds the scenario parameters for a resource of `length` bytes
    ///
    /// `length` must not exceed `i64::MAX`.
    pub fn scenario(&self, length: u64) -> ReadScenario {
        let len = length as i64;

        match self {
            ScenarioClass::FullRange => ReadScenario::from_start(0, length, 0, length),
            ScenarioClass::MidRange => {
                let offset = (length / 7) as i64;
                ReadScenario::from_start(offset, length / 2, offset, length / 2)
            }
            ScenarioClass::TailOverrun => {
                let offset = len - TAIL_OFFSET as i64;
                if length < TAIL_OFFSET {
                    // Seek must fail, expected size is never compared.
                    ReadScenario::from_start(offset, TAIL_READ_SIZE, -1, u64::MAX)
                } else {
                    ReadScenario::from_start(offset, TAIL_READ_SIZE, offset, TAIL_OFFSET)
                }
            }
            ScenarioClass::OffsetMidRange => {
                let offset = (length / 7) as i64;
                let size = length / 2;
                ReadScenario::from_start(offset, size, offset + size as i64, size)
            }
        }
    }
}

impl fmt::Display for ScenarioClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whence_name() {
        assert_eq!(Whence::Start.name(), "start");
        assert_eq!(Whence::Current.to_string(), "current");
        assert_eq!(Whence::End.to_string(), "end");
    }

    #[test]
    fn test_outcome_from_check() {
        assert_eq!(Outcome::from_check(true), Outcome::Pass);
        assert_eq!(Outcome::from_check(false), Outcome::Fail);
        assert!(Outcome::Pass.is_pass());
        assert_eq!(Outcome::Fail.to_string(), "FAIL");
    }

    #[test]
    fn test_scenarios_for_5000_bytes() {
        let full = ScenarioClass::FullRange.scenario(5000);
        assert_eq!(full, ReadScenario::from_start(0, 5000, 0, 5000));

        let mid = ScenarioClass::MidRange.scenario(5000);
        assert_eq!(mid, ReadScenario::from_start(714, 2500, 714, 2500));

        let tail = ScenarioClass::TailOverrun.scenario(5000);
        assert_eq!(tail, ReadScenario::from_start(3976, 4096, 3976, 1024));

        let offset = ScenarioClass::OffsetMidRange.scenario(5000);
        assert_eq!(offset, ReadScenario::from_start(714, 2500, 3214, 2500));
    }

    #[test]
    fn test_tail_scenario_for_small_resource() {
        let tail = ScenarioClass::TailOverrun.scenario(100);
        assert_eq!(tail.input_offset, -924);
        assert_eq!(tail.expected_offset, -1);
    }

    #[test]
    fn test_tail_scenario_at_boundary() {
        let tail = ScenarioClass::TailOverrun.scenario(1024);
        assert_eq!(tail.input_offset, 0);
        assert_eq!(tail.expected_offset, 0);
        assert_eq!(tail.expected_size, 1024);
    }

    #[test]
    fn test_only_offset_class_uses_offset_reads() {
        let offset_classes: Vec<_> = ScenarioClass::ALL
            .iter()
            .filter(|class| class.uses_offset_reads())
            .collect();
        assert_eq!(offset_classes, vec![&ScenarioClass::OffsetMidRange]);
    }
}
