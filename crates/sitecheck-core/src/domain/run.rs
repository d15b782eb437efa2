//! Check run aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::{CheckOutcome, CheckResult};

/// Exit code for a run without failures.
pub const EXIT_OK: u8 = 0;
/// Exit code for a run with at least one failed check.
pub const EXIT_FAILED: u8 = 1;
/// Exit code for an invalid command line.
pub const EXIT_USAGE: u8 = 2;

/// Ordered results of one suite invocation.
///
/// Counts are derived from `results`; nothing else tracks pass/fail state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckRun {
    pub run_id: Uuid,
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

impl CheckRun {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.into(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    fn count(&self, outcome: CheckOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(CheckOutcome::Pass)
    }

    pub fn warned(&self) -> usize {
        self.count(CheckOutcome::Warn)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckOutcome::Fail)
    }

    pub fn skipped(&self) -> usize {
        self.count(CheckOutcome::Skip)
    }

    /// Failed results in run order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.is_fail())
    }

    /// 0 when nothing failed, 1 otherwise. Warnings never matter.
    pub fn exit_code(&self) -> u8 {
        if self.failed() == 0 {
            EXIT_OK
        } else {
            EXIT_FAILED
        }
    }
}

/// Pass/warn/fail/skip tally, used to compare runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCounts {
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl From<&CheckRun> for RunCounts {
    fn from(run: &CheckRun) -> Self {
        Self {
            passed: run.passed(),
            warned: run.warned(),
            failed: run.failed(),
            skipped: run.skipped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check::{CheckCategory, FailureKind};

    #[test]
    fn test_empty_run_exits_zero() {
        let run = CheckRun::new("local");
        assert_eq!(run.failed(), 0);
        assert_eq!(run.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_warnings_do_not_affect_exit_code() {
        let mut run = CheckRun::new("local");
        run.push(CheckResult::pass("a", CheckCategory::FileExistence));
        run.push(CheckResult::warn("b", CheckCategory::ContentMatch));
        run.push(CheckResult::skip("c", CheckCategory::SizeThreshold, "missing"));
        assert_eq!(run.exit_code(), EXIT_OK);
        assert_eq!(
            RunCounts::from(&run),
            RunCounts {
                passed: 1,
                warned: 1,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_single_failure_exits_one() {
        let mut run = CheckRun::new("deploy");
        run.push(CheckResult::pass("a", CheckCategory::HttpStatus));
        run.push(CheckResult::fail(
            "b",
            CheckCategory::HttpStatus,
            FailureKind::UnexpectedStatus,
        ));
        assert_eq!(run.exit_code(), EXIT_FAILED);
        assert_eq!(run.failures().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }
}
