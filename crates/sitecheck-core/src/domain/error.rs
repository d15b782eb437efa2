//! Error taxonomy for sitecheck.
//!
//! Problems with the *site* are recorded as check outcomes, not errors.
//! [`SiteCheckError`] covers the tool itself failing: unreadable files,
//! broken configuration, a git binary that cannot be spawned.

/// sitecheck library errors.
///
/// Messages already embed the underlying error, so no variant exposes it
/// again as a `source()`. That keeps `{:#}` chains from printing it twice.
#[derive(Debug, thiserror::Error)]
pub enum SiteCheckError {
    #[error("io error: {0}")]
    Io(std::io::Error),

    #[error("json error: {0}")]
    Json(serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(toml::de::Error),

    #[error("git error: {0}")]
    Git(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("invalid marker pattern: {0}")]
    Pattern(regex::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for SiteCheckError {
    fn from(err: std::io::Error) -> Self {
        SiteCheckError::Io(err)
    }
}

impl From<serde_json::Error> for SiteCheckError {
    fn from(err: serde_json::Error) -> Self {
        SiteCheckError::Json(err)
    }
}

impl From<toml::de::Error> for SiteCheckError {
    fn from(err: toml::de::Error) -> Self {
        SiteCheckError::Toml(err)
    }
}

impl From<regex::Error> for SiteCheckError {
    fn from(err: regex::Error) -> Self {
        SiteCheckError::Pattern(err)
    }
}

impl From<reqwest::Error> for SiteCheckError {
    fn from(err: reqwest::Error) -> Self {
        SiteCheckError::Http(err.to_string())
    }
}

/// Result type for sitecheck library operations.
pub type Result<T> = std::result::Result<T, SiteCheckError>;
