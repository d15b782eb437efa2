//! Report sinks.
//!
//! The runner pushes every result to a [`ReportSink`] as soon as it is
//! produced, so a person watching a slow deploy check sees progress line by
//! line. [`ConsoleSink`] renders the emoji-prefixed format; [`MemorySink`]
//! keeps the lines for tests.

use std::io::Write;
use std::path::Path;

use crate::domain::{CheckRun, CheckResult, Confidence, Result};

/// Receives report output in run order.
pub trait ReportSink {
    fn section(&mut self, title: &str);
    fn result(&mut self, result: &CheckResult);
    fn note(&mut self, message: &str);
    fn progress(&mut self, message: &str);
    fn summary(&mut self, run: &CheckRun);
}

/// One console line for a result, without details.
pub fn format_result(result: &CheckResult) -> String {
    let mut line = format!("{} {}", result.outcome.symbol(), result.name);
    match (&result.expected, &result.actual) {
        (Some(expected), Some(actual)) => {
            line.push_str(&format!(" (expected {expected}, got {actual})"));
        }
        (None, Some(actual)) => line.push_str(&format!(" ({actual})")),
        (Some(expected), None) => line.push_str(&format!(" (expected {expected})")),
        (None, None) => {}
    }
    if result.confidence == Confidence::Heuristic {
        line.push_str(" [heuristic]");
    }
    line
}

fn summary_lines(run: &CheckRun) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "==========================================".to_string(),
        format!(
            "Summary ({}): {} passed, {} warnings, {} failed, {} skipped",
            run.suite,
            run.passed(),
            run.warned(),
            run.failed(),
            run.skipped()
        ),
    ];
    if run.failed() == 0 {
        lines.push("✅ All checks passed".to_string());
    } else {
        lines.push(format!("❌ {} check(s) failed:", run.failed()));
        for failure in run.failures() {
            lines.push(format!("   - {}", failure.name));
        }
    }
    lines
}

/// Writes the human-readable report to any writer, stdout by default.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A closed stdout (e.g. piped into `head`) must not abort the run.
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn section(&mut self, title: &str) {
        self.line("");
        self.line(&format!("🔍 {title}"));
    }

    fn result(&mut self, result: &CheckResult) {
        self.line(&format_result(result));
        for detail in &result.details {
            self.line(&format!("     - {detail}"));
        }
    }

    fn note(&mut self, message: &str) {
        self.line(&format!("ℹ️  {message}"));
    }

    fn progress(&mut self, message: &str) {
        self.line(&format!("⏳ {message}"));
        let _ = self.out.flush();
    }

    fn summary(&mut self, run: &CheckRun) {
        for line in summary_lines(run) {
            self.line(&line);
        }
        let _ = self.out.flush();
    }
}

/// Collects report lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl ReportSink for MemorySink {
    fn section(&mut self, title: &str) {
        self.lines.push(format!("== {title}"));
    }

    fn result(&mut self, result: &CheckResult) {
        self.lines.push(format_result(result));
        self.lines.extend(result.details.iter().map(|d| format!("  - {d}")));
    }

    fn note(&mut self, message: &str) {
        self.lines.push(format!("note: {message}"));
    }

    fn progress(&mut self, message: &str) {
        self.lines.push(format!("progress: {message}"));
    }

    fn summary(&mut self, run: &CheckRun) {
        self.lines.extend(summary_lines(run));
    }
}

/// Write a run as pretty-printed JSON.
pub fn write_json_report(run: &CheckRun, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(run)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckCategory, FailureKind};

    #[test]
    fn test_format_result_with_expected_and_actual() {
        let r = CheckResult::fail("CNAME matches domain", CheckCategory::ContentMatch, FailureKind::MalformedArtifact)
            .with_expected("podcast.example.com")
            .with_actual("old.example.com");
        assert_eq!(
            format_result(&r),
            "❌ CNAME matches domain (expected podcast.example.com, got old.example.com)"
        );
    }

    #[test]
    fn test_heuristic_results_are_marked() {
        let r = CheckResult::pass("sitemap.xml is well-formed XML", CheckCategory::XmlWellFormedness)
            .with_confidence(Confidence::Heuristic);
        assert!(format_result(&r).ends_with("[heuristic]"));
    }

    #[test]
    fn test_console_sink_prints_details_and_summary() {
        let mut run = CheckRun::new("local");
        let r = CheckResult::fail("episode pages", CheckCategory::DirectoryCoverage, FailureKind::MissingArtifact)
            .with_actual("8/10")
            .with_details(["ep-03", "ep-07"]);
        run.push(r.clone());

        let mut sink = ConsoleSink::new(Vec::new());
        sink.result(&r);
        sink.summary(&run);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("❌ episode pages (8/10)"));
        assert!(text.contains("- ep-03"));
        assert!(text.contains("0 passed, 0 warnings, 1 failed, 0 skipped"));
        assert!(text.contains("   - episode pages"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/local.json");
        let mut run = CheckRun::new("local");
        run.push(CheckResult::pass("style.css exists", CheckCategory::FileExistence));
        write_json_report(&run, &path).unwrap();
        let loaded: CheckRun = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, run);
    }
}
