//! Check specifications.
//!
//! A suite is plain data: sections of steps, each step a single check or a
//! group gated on a local file. The runner interprets it.

use serde::{Deserialize, Serialize};
use sitecheck_core::{CheckCategory, FailureKind, Marker, PollPolicy};

/// What a check evaluates. Paths are repository-relative for local checks
/// and site-relative for remote ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckSpec {
    /// Local file exists.
    FileExists { path: String },
    /// Local file is strictly larger than `min_bytes`.
    FileSizeAbove { path: String, min_bytes: u64 },
    /// Local file contains a marker.
    ContainsMarker { path: String, marker: Marker },
    /// Trimmed local file contents equal `expected`.
    FileEquals { path: String, expected: String },
    /// Local file is well-formed XML.
    WellFormedXml { path: String },
    /// Every subdirectory of `dir` holds `required`.
    DirectoryCoverage { dir: String, required: String },
    /// Metadata file parses and every record has a page directory.
    MetadataConsistent { path: String },
    /// No pending deletion of a protected path.
    DiffGuard,
    /// Site answers 200 within the poll policy.
    ReachableWithin { path: String, policy: PollPolicy },
    /// Remote status equals `expected` (no redirects followed).
    HttpStatus { path: String, expected: u16 },
    /// Remote header contains `needle`, case-insensitively.
    HeaderContains {
        path: String,
        header: String,
        needle: String,
    },
    /// Remote body (after redirects) contains a marker.
    BodyContains { path: String, marker: Marker },
    /// Remote body is well-formed XML.
    RemoteXml { path: String },
    /// Remote `Content-Length` within tolerance of the local file size.
    SizeMatchesLocal { path: String, tolerance_pct: f64 },
    /// Local domain-binding file names the host of the base URL.
    DomainMatchesBaseUrl { path: String },
    /// Every episode in the metadata file answers 200.
    EpisodesReachable { metadata: String },
    /// Deployed episode page embeds the video declared in its metadata.
    EmbedMatches { slug: String },
    /// Deployed sitemap lists the episode.
    SitemapListsSlug { sitemap: String, slug: String },
}

impl CheckSpec {
    pub fn category(&self) -> CheckCategory {
        match self {
            CheckSpec::FileExists { .. } => CheckCategory::FileExistence,
            CheckSpec::FileSizeAbove { .. } => CheckCategory::SizeThreshold,
            CheckSpec::ContainsMarker { .. } | CheckSpec::FileEquals { .. } => {
                CheckCategory::ContentMatch
            }
            CheckSpec::WellFormedXml { .. } | CheckSpec::RemoteXml { .. } => {
                CheckCategory::XmlWellFormedness
            }
            CheckSpec::DirectoryCoverage { .. } => CheckCategory::DirectoryCoverage,
            CheckSpec::MetadataConsistent { .. } => CheckCategory::Metadata,
            CheckSpec::DiffGuard => CheckCategory::DiffGuard,
            CheckSpec::ReachableWithin { .. } => CheckCategory::Reachability,
            CheckSpec::HttpStatus { .. } | CheckSpec::EpisodesReachable { .. } => {
                CheckCategory::HttpStatus
            }
            CheckSpec::HeaderContains { .. } => CheckCategory::HttpHeader,
            CheckSpec::BodyContains { .. } => CheckCategory::HttpBody,
            CheckSpec::SizeMatchesLocal { .. } => CheckCategory::SizeComparison,
            CheckSpec::DomainMatchesBaseUrl { .. } => CheckCategory::ContentMatch,
            CheckSpec::EmbedMatches { .. } | CheckSpec::SitemapListsSlug { .. } => {
                CheckCategory::CrossReference
            }
        }
    }

    /// Failure kind recorded when the check cannot run at all.
    pub fn error_kind(&self) -> FailureKind {
        match self {
            CheckSpec::DiffGuard => FailureKind::ToolFailed,
            CheckSpec::FileExists { .. } => FailureKind::MissingArtifact,
            CheckSpec::ReachableWithin { .. }
            | CheckSpec::HttpStatus { .. }
            | CheckSpec::HeaderContains { .. }
            | CheckSpec::BodyContains { .. }
            | CheckSpec::RemoteXml { .. }
            | CheckSpec::SizeMatchesLocal { .. }
            | CheckSpec::EpisodesReachable { .. }
            | CheckSpec::EmbedMatches { .. }
            | CheckSpec::SitemapListsSlug { .. } => FailureKind::UnreachableEndpoint,
            _ => FailureKind::MalformedArtifact,
        }
    }

    /// Whether the check needs network access.
    pub fn is_remote(&self) -> bool {
        self.error_kind() == FailureKind::UnreachableEndpoint
    }
}

/// A named check. Advisory checks report warnings instead of failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Check {
    pub name: String,
    pub spec: CheckSpec,
    #[serde(default)]
    pub advisory: bool,
}

impl Check {
    pub fn new(name: impl Into<String>, spec: CheckSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            advisory: false,
        }
    }

    pub fn advisory(mut self) -> Self {
        self.advisory = true;
        self
    }
}

/// One unit of a section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Single { check: Check },
    /// Checks that only make sense when `requires` exists locally.
    Gated { requires: String, checks: Vec<Check> },
}

impl Step {
    pub fn single(check: Check) -> Self {
        Step::Single { check }
    }

    pub fn gated(requires: impl Into<String>, checks: Vec<Check>) -> Self {
        Step::Gated {
            requires: requires.into(),
            checks,
        }
    }

    pub fn checks(&self) -> &[Check] {
        match self {
            Step::Single { check } => std::slice::from_ref(check),
            Step::Gated { checks, .. } => checks,
        }
    }
}

/// Titled group of steps, printed as a report heading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub title: String,
    pub steps: Vec<Step>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn check(self, check: Check) -> Self {
        self.step(Step::single(check))
    }

    pub fn gated(self, requires: impl Into<String>, checks: Vec<Check>) -> Self {
        self.step(Step::gated(requires, checks))
    }
}

/// Ordered sections run by one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suite {
    pub name: String,
    pub sections: Vec<Section>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// All checks in run order.
    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.sections
            .iter()
            .flat_map(|s| s.steps.iter())
            .flat_map(|step| step.checks().iter())
    }

    pub fn is_remote(&self) -> bool {
        self.checks().any(|c| c.spec.is_remote())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let spec = CheckSpec::FileExists {
            path: "style.css".to_string(),
        };
        assert_eq!(spec.category(), CheckCategory::FileExistence);
        assert_eq!(spec.error_kind(), FailureKind::MissingArtifact);
        assert!(!spec.is_remote());

        // A git failure is not evidence of a deletion.
        assert_eq!(CheckSpec::DiffGuard.error_kind(), FailureKind::ToolFailed);
        assert!(!CheckSpec::DiffGuard.is_remote());

        let spec = CheckSpec::HttpStatus {
            path: "/".to_string(),
            expected: 200,
        };
        assert_eq!(spec.category(), CheckCategory::HttpStatus);
        assert!(spec.is_remote());
    }

    #[test]
    fn test_suite_checks_in_order() {
        let suite = Suite::new("local")
            .section(Section::new("Critical files").check(Check::new(
                "style.css exists",
                CheckSpec::FileExists {
                    path: "style.css".to_string(),
                },
            )))
            .section(Section::new("Stylesheet").gated(
                "style.css",
                vec![Check::new(
                    "style.css size",
                    CheckSpec::FileSizeAbove {
                        path: "style.css".to_string(),
                        min_bytes: 1000,
                    },
                )],
            ));
        let names: Vec<_> = suite.checks().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["style.css exists", "style.css size"]);
        assert!(!suite.is_remote());
    }

    #[test]
    fn test_advisory_flag() {
        let check = Check::new("robots", CheckSpec::DiffGuard).advisory();
        assert!(check.advisory);
    }

    #[test]
    fn test_spec_serialization_is_tagged() {
        let spec = CheckSpec::FileEquals {
            path: "CNAME".to_string(),
            expected: "podcast.example.com".to_string(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "file_equals");
    }
}
