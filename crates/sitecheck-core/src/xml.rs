//! XML well-formedness.
//!
//! Uses `xmllint` when it is on `PATH`. Without it the validator falls back
//! to a heuristic (XML declaration present, document ends with the closing
//! tag of its root element) and marks the verdict [`Confidence::Heuristic`].
//! The heuristic accepts plenty of broken documents; it only catches
//! truncation and empty files.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::domain::{Confidence, Result};

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlVerdict {
    pub well_formed: bool,
    pub confidence: Confidence,
    /// Parser message or heuristic reason when not well formed.
    pub reason: Option<String>,
}

impl XmlVerdict {
    fn verified(well_formed: bool, reason: Option<String>) -> Self {
        Self {
            well_formed,
            confidence: Confidence::Verified,
            reason,
        }
    }

    fn heuristic(well_formed: bool, reason: Option<String>) -> Self {
        Self {
            well_formed,
            confidence: Confidence::Heuristic,
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Auto,
    HeuristicOnly,
}

/// Validates XML with `xmllint`, falling back to a heuristic.
#[derive(Debug, Clone)]
pub struct XmlValidator {
    mode: Mode,
    program: String,
}

impl Default for XmlValidator {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            program: "xmllint".to_string(),
        }
    }
}

impl XmlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never invoke an external parser.
    pub fn heuristic_only() -> Self {
        Self {
            mode: Mode::HeuristicOnly,
            ..Self::default()
        }
    }

    /// Use a different parser binary (must accept `--noout -`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn validate_file(&self, path: &Path) -> Result<XmlVerdict> {
        let bytes = std::fs::read(path)?;
        Ok(self.validate_str(&String::from_utf8_lossy(&bytes)))
    }

    pub fn validate_str(&self, text: &str) -> XmlVerdict {
        if self.mode == Mode::Auto {
            match self.run_parser(text) {
                Ok(verdict) => return verdict,
                Err(e) => {
                    warn!(program = %self.program, error = %e, "XML parser unavailable, using heuristic");
                }
            }
        }
        heuristic_check(text)
    }

    fn run_parser(&self, text: &str) -> std::io::Result<XmlVerdict> {
        let mut child = Command::new(&self.program)
            .args(["--noout", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A parser that bails early closes its stdin; the exit status still tells us why.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                debug!(error = %e, "XML parser closed stdin early");
            }
        }
        let output = child.wait_with_output()?;

        if output.status.success() {
            Ok(XmlVerdict::verified(true, None))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first = stderr.lines().next().unwrap_or("parse error").trim().to_string();
            Ok(XmlVerdict::verified(false, Some(first)))
        }
    }
}

/// Declaration present and the document ends with `</root>`.
pub fn heuristic_check(text: &str) -> XmlVerdict {
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if !trimmed.starts_with("<?xml") {
        return XmlVerdict::heuristic(false, Some("missing XML declaration".to_string()));
    }
    let Some(root) = root_element_name(trimmed) else {
        return XmlVerdict::heuristic(false, Some("no root element".to_string()));
    };
    let closing = format!("</{root}>");
    if trimmed.ends_with(&closing) {
        XmlVerdict::heuristic(true, None)
    } else {
        XmlVerdict::heuristic(false, Some(format!("document does not end with {closing}")))
    }
}

/// Name of the first element that is not a declaration, comment or doctype.
fn root_element_name(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        return if name.is_empty() { None } else { Some(name) };
    }
    None
}
