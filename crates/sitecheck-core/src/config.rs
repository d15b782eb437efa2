//! Site configuration.
//!
//! Resolution order: compiled defaults, then `sitecheck.toml` in the
//! repository root (if present), then `SITECHECK_*` environment variables.
//! The CLI applies its own flags last.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, SiteCheckError};

/// File name of the optional per-repository config.
pub const CONFIG_FILE: &str = "sitecheck.toml";

pub const ENV_BASE_URL: &str = "SITECHECK_BASE_URL";
pub const ENV_DOMAIN: &str = "SITECHECK_DOMAIN";

/// Literal substring or regular expression looked for in a file or body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Marker {
    Literal(String),
    Pattern { pattern: String },
}

impl Marker {
    pub fn literal(text: impl Into<String>) -> Self {
        Marker::Literal(text.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Marker::Pattern {
            pattern: pattern.into(),
        }
    }

    /// Whether `haystack` contains the marker.
    pub fn matches(&self, haystack: &str) -> Result<bool> {
        match self {
            Marker::Literal(text) => Ok(haystack.contains(text.as_str())),
            Marker::Pattern { pattern } => Ok(regex::Regex::new(pattern)?.is_match(haystack)),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Literal(text) => write!(f, "'{text}'"),
            Marker::Pattern { pattern } => write!(f, "/{pattern}/"),
        }
    }
}

/// Repository-relative paths whose absence breaks the site.
///
/// Built once from [`SiteConfig`]; never modified during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalFileSet {
    paths: Vec<String>,
}

impl CriticalFileSet {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Everything a suite needs to know about the site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// Public URL of the deployed site.
    pub base_url: String,
    /// Expected contents of the domain-binding file.
    pub expected_domain: String,

    pub critical_files: Vec<String>,

    pub stylesheet: String,
    pub min_stylesheet_bytes: u64,
    /// Layout classes the stylesheet must define.
    pub stylesheet_markers: Vec<Marker>,

    pub homepage: String,
    pub homepage_markers: Vec<Marker>,

    pub robots: String,
    pub sitemap: String,
    pub feed: String,
    pub domain_file: String,
    pub metadata_file: String,
    pub llms_files: Vec<String>,
    pub min_llms_bytes: u64,

    /// Directory holding one subdirectory per episode.
    pub content_dir: String,
    /// Entry file each episode directory must contain.
    pub index_file: String,

    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub request_timeout_secs: u64,
    pub size_tolerance_pct: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            base_url: "https://podcast.example.com".to_string(),
            expected_domain: "podcast.example.com".to_string(),
            critical_files: [
                "style.css",
                "index.html",
                "robots.txt",
                "sitemap.xml",
                "feed.xml",
                "CNAME",
                "episodes.json",
                "llms.txt",
                "llms-full.txt",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            stylesheet: "style.css".to_string(),
            min_stylesheet_bytes: 1000,
            stylesheet_markers: vec![Marker::literal(".container"), Marker::literal(".episode")],
            homepage: "index.html".to_string(),
            homepage_markers: vec![
                Marker::literal("style.css"),
                Marker::pattern(r"(?is)<title>.+?</title>"),
            ],
            robots: "robots.txt".to_string(),
            sitemap: "sitemap.xml".to_string(),
            feed: "feed.xml".to_string(),
            domain_file: "CNAME".to_string(),
            metadata_file: "episodes.json".to_string(),
            llms_files: vec!["llms.txt".to_string(), "llms-full.txt".to_string()],
            min_llms_bytes: 100,
            content_dir: "episodes".to_string(),
            index_file: "index.html".to_string(),
            poll_interval_secs: 5,
            max_wait_secs: 90,
            request_timeout_secs: 10,
            size_tolerance_pct: 10.0,
        }
    }
}

impl SiteConfig {
    /// Defaults, overlaid with `sitecheck.toml` and the environment.
    pub fn load(repo_dir: &Path) -> Result<Self> {
        let path = repo_dir.join(CONFIG_FILE);
        let mut config = if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading config file");
            Self::from_toml(&std::fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `SITECHECK_*` overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(domain) = lookup(ENV_DOMAIN).filter(|v| !v.trim().is_empty()) {
            self.expected_domain = domain.trim().to_string();
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SiteCheckError::InvalidConfig(format!("base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SiteCheckError::InvalidConfig(format!(
                "base_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.content_dir.is_empty() || self.index_file.is_empty() {
            return Err(SiteCheckError::InvalidConfig(
                "content_dir and index_file must not be empty".to_string(),
            ));
        }
        if self.size_tolerance_pct.is_nan() || self.size_tolerance_pct < 0.0 {
            return Err(SiteCheckError::InvalidConfig(format!(
                "size_tolerance_pct must be non-negative, got {}",
                self.size_tolerance_pct
            )));
        }
        Ok(())
    }

    pub fn critical_file_set(&self) -> CriticalFileSet {
        CriticalFileSet::new(self.critical_files.iter().cloned())
    }

    /// Absolute URL for a site-relative path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of an episode page, with the trailing slash Pages serves it under.
    pub fn episode_url(&self, slug: &str) -> String {
        self.url(&format!("{}/{}/", self.content_dir, slug))
    }

    /// Repository-relative entry file of an episode.
    pub fn episode_entry(&self, slug: &str) -> PathBuf {
        Path::new(&self.content_dir).join(slug).join(&self.index_file)
    }

    /// Host part of `base_url`.
    pub fn base_host(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
