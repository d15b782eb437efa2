//! Exit gate over a finished run.

use serde::{Deserialize, Serialize};
use sitecheck_core::{CheckOutcome, CheckRun};

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// One entry per failed check (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,

    /// Process exit code for the run.
    pub exit_code: u8,
}

/// Pass/fail rule for a run: warnings and skips never block, failures do.
pub struct ExitGate;

impl ExitGate {
    pub fn evaluate(run: &CheckRun) -> GateVerdict {
        let violations: Vec<String> = run
            .results
            .iter()
            .filter(|r| r.outcome == CheckOutcome::Fail)
            .map(|r| match r.failure {
                Some(kind) => format!("{} ({kind:?})", r.name),
                None => r.name.clone(),
            })
            .collect();

        let passed = violations.is_empty();
        let message = if passed {
            match run.warned() {
                0 => "All checks passed".to_string(),
                n => format!("All checks passed with {n} warning(s)"),
            }
        } else {
            format!("{} check(s) failed", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
            exit_code: run.exit_code(),
        }
    }
}
