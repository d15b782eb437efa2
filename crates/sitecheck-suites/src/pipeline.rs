//! Suite orchestration.

use sitecheck_core::{CheckResult, CheckRun, ReportSink};
use tracing::{info, warn};

use crate::context::CheckContext;
use crate::runner::CheckRunner;
use crate::spec::{Check, Step, Suite};

/// Runs a suite sequentially, in declaration order.
pub struct CheckPipeline;

impl CheckPipeline {
    /// Execute every check and collect the results into a [`CheckRun`].
    ///
    /// A failing check never stops the run. Each result is pushed to `sink`
    /// as soon as it exists. Checks in a gated step whose required file is
    /// missing are recorded as skipped, so a missing file is reported once
    /// by its existence check and not again by every content check.
    pub async fn run(suite: &Suite, ctx: &mut CheckContext, sink: &mut dyn ReportSink) -> CheckRun {
        let mut run = CheckRun::new(&suite.name);
        info!(run_id = %run.run_id, suite = %suite.name, "Starting check suite");

        for section in &suite.sections {
            sink.section(&section.title);
            for step in &section.steps {
                match step {
                    Step::Single { check } => {
                        let result = Self::run_check(check, ctx, sink).await;
                        Self::record(&mut run, result, sink);
                    }
                    Step::Gated { requires, checks } => {
                        if ctx.local_path(requires).is_file() {
                            for check in checks {
                                let result = Self::run_check(check, ctx, sink).await;
                                Self::record(&mut run, result, sink);
                            }
                        } else {
                            for check in checks {
                                let result = CheckResult::skip(
                                    &check.name,
                                    check.spec.category(),
                                    format!("{requires} is missing"),
                                );
                                Self::record(&mut run, result, sink);
                            }
                        }
                    }
                }
            }
        }

        sink.summary(&run);
        if run.failed() == 0 {
            info!(run_id = %run.run_id, passed = run.passed(), warned = run.warned(), "Check suite passed");
        } else {
            info!(run_id = %run.run_id, failed = run.failed(), "Check suite failed");
        }
        run
    }

    async fn run_check(check: &Check, ctx: &mut CheckContext, sink: &mut dyn ReportSink) -> CheckResult {
        let result = match CheckRunner::evaluate(check, ctx, sink).await {
            Ok(result) => result,
            Err(e) => {
                // The check could not run; that is a failure of the check.
                warn!(check = %check.name, error = %e, "Check could not run");
                CheckResult::fail(&check.name, check.spec.category(), check.spec.error_kind())
                    .with_actual("error")
                    .with_detail(e.to_string())
            }
        };
        if check.advisory {
            result.advisory()
        } else {
            result
        }
    }

    fn record(run: &mut CheckRun, result: CheckResult, sink: &mut dyn ReportSink) {
        sink.result(&result);
        run.push(result);
    }
}
