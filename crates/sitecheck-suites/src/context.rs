//! Shared state for one suite invocation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sitecheck_core::{
    DiffGuard, FetchedBody, ProtectedPaths, Prober, Result, SiteCheckError, SiteConfig,
    XmlValidator,
};

/// Everything a check needs besides its own spec.
///
/// Remote bodies are fetched once per URL and reused by later checks in the
/// same run.
pub struct CheckContext {
    pub repo_dir: PathBuf,
    pub config: SiteConfig,
    pub xml: XmlValidator,
    pub guard: DiffGuard,
    prober: Option<Prober>,
    bodies: HashMap<String, std::result::Result<FetchedBody, String>>,
}

impl CheckContext {
    /// Context for local checks only.
    pub fn local(repo_dir: impl Into<PathBuf>, config: SiteConfig) -> Self {
        let guard = DiffGuard::new(ProtectedPaths::from_config(&config));
        Self {
            repo_dir: repo_dir.into(),
            config,
            xml: XmlValidator::new(),
            guard,
            prober: None,
            bodies: HashMap::new(),
        }
    }

    /// Context with an HTTP prober built from the configured request timeout.
    pub fn remote(repo_dir: impl Into<PathBuf>, config: SiteConfig) -> Result<Self> {
        let prober = Prober::new(config.request_timeout())?;
        Ok(Self::local(repo_dir, config).with_prober(prober))
    }

    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_xml_validator(mut self, xml: XmlValidator) -> Self {
        self.xml = xml;
        self
    }

    /// Repository path of a repository-relative file.
    pub fn local_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.repo_dir.join(relative)
    }

    pub fn prober(&self) -> Result<&Prober> {
        self.prober.as_ref().ok_or_else(|| {
            SiteCheckError::InvalidConfig("remote check run without an HTTP prober".to_string())
        })
    }

    /// Body of `url` after redirects, fetched at most once per run.
    ///
    /// Transport errors are returned as their message.
    pub async fn body(&mut self, url: &str) -> std::result::Result<FetchedBody, String> {
        if let Some(cached) = self.bodies.get(url) {
            return cached.clone();
        }
        let fetched = match &self.prober {
            Some(prober) => prober.fetch_body(url).await.map_err(|e| e.to_string()),
            None => Err("no HTTP prober configured".to_string()),
        };
        self.bodies.insert(url.to_string(), fetched.clone());
        fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_context_has_no_prober() {
        let ctx = CheckContext::local("/tmp/site", SiteConfig::default());
        assert!(ctx.prober().is_err());
        assert_eq!(ctx.local_path("style.css"), PathBuf::from("/tmp/site/style.css"));
    }

    #[tokio::test]
    async fn test_body_without_prober_is_error() {
        let mut ctx = CheckContext::local("/tmp/site", SiteConfig::default());
        let err = ctx.body("https://podcast.example.com/").await.unwrap_err();
        assert!(err.contains("no HTTP prober"));
    }
}
