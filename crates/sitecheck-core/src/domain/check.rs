//! Single check results.

use serde::{Deserialize, Serialize};

/// Outcome of one check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Warn,
    Fail,
    /// Precondition missing; the check was not attempted.
    Skip,
}

impl CheckOutcome {
    /// Emoji prefix used on console report lines.
    pub fn symbol(&self) -> &'static str {
        match self {
            CheckOutcome::Pass => "✅",
            CheckOutcome::Warn => "⚠️ ",
            CheckOutcome::Fail => "❌",
            CheckOutcome::Skip => "⏭️ ",
        }
    }
}

/// What kind of predicate a check evaluates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    FileExistence,
    ContentMatch,
    SizeThreshold,
    DirectoryCoverage,
    XmlWellFormedness,
    DiffGuard,
    HttpStatus,
    HttpHeader,
    HttpBody,
    SizeComparison,
    CrossReference,
    Reachability,
    Metadata,
}

/// Why a check failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Required local file absent.
    MissingArtifact,
    /// Present but fails a content or structure check.
    MalformedArtifact,
    /// Suspiciously small, or local/remote size mismatch beyond tolerance.
    SizeAnomaly,
    /// Connection failure or timeout.
    UnreachableEndpoint,
    /// Non-200 HTTP response.
    UnexpectedStatus,
    /// Pending deletion of a protected path.
    DestructiveChange,
    /// The tool behind a check (git) failed, so nothing was verified.
    ToolFailed,
}

/// How much a result can be trusted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    Verified,
    /// Produced by a weaker fallback (no XML parser, no remote size).
    Heuristic,
}

/// Recorded result of one check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub category: CheckCategory,
    pub outcome: CheckOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    /// Extra lines printed beneath the result, e.g. individually missing entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl CheckResult {
    fn new(name: impl Into<String>, category: CheckCategory, outcome: CheckOutcome) -> Self {
        Self {
            name: name.into(),
            category,
            outcome,
            failure: None,
            expected: None,
            actual: None,
            confidence: Confidence::Verified,
            details: Vec::new(),
        }
    }

    pub fn pass(name: impl Into<String>, category: CheckCategory) -> Self {
        Self::new(name, category, CheckOutcome::Pass)
    }

    pub fn warn(name: impl Into<String>, category: CheckCategory) -> Self {
        Self::new(name, category, CheckOutcome::Warn)
    }

    pub fn fail(name: impl Into<String>, category: CheckCategory, kind: FailureKind) -> Self {
        let mut result = Self::new(name, category, CheckOutcome::Fail);
        result.failure = Some(kind);
        result
    }

    pub fn skip(name: impl Into<String>, category: CheckCategory, reason: impl Into<String>) -> Self {
        Self::new(name, category, CheckOutcome::Skip).with_detail(reason)
    }

    /// Pass or fail depending on `ok`.
    pub fn from_bool(
        name: impl Into<String>,
        category: CheckCategory,
        ok: bool,
        kind: FailureKind,
    ) -> Self {
        if ok {
            Self::pass(name, category)
        } else {
            Self::fail(name, category, kind)
        }
    }

    /// Downgrade a failure to a warning, keeping the rest of the result.
    pub fn advisory(mut self) -> Self {
        if self.outcome == CheckOutcome::Fail {
            self.outcome = CheckOutcome::Warn;
            self.failure = None;
        }
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn with_details<I, S>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(details.into_iter().map(Into::into));
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_fail(&self) -> bool {
        self.outcome == CheckOutcome::Fail
    }
}
