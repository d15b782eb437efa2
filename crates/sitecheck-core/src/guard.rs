//! Diff guard: refuse pending deletions of protected site files.
//!
//! Protected paths are the critical file set plus every
//! `<content_dir>/<slug>/<index_file>`. Both the index and the work tree are
//! compared against HEAD, so staged and unstaged deletions are caught.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::config::{CriticalFileSet, SiteConfig};
use crate::domain::Result;
use crate::git;

/// The set of paths a push must not delete.
#[derive(Debug, Clone)]
pub struct ProtectedPaths {
    critical: CriticalFileSet,
    content_dir: String,
    index_file: String,
}

impl ProtectedPaths {
    pub fn new(critical: CriticalFileSet, content_dir: &str, index_file: &str) -> Self {
        Self {
            critical,
            content_dir: content_dir.trim_matches('/').to_string(),
            index_file: index_file.to_string(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.critical_file_set(), &config.content_dir, &config.index_file)
    }

    /// Whether a repository-relative path (forward slashes) is protected.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.critical.contains(path) {
            return true;
        }
        let Some(rest) = path.strip_prefix(&self.content_dir).and_then(|r| r.strip_prefix('/'))
        else {
            return false;
        };
        match rest.split_once('/') {
            Some((slug, file)) => !slug.is_empty() && file == self.index_file,
            None => false,
        }
    }
}

/// Outcome of inspecting the pending change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardReport {
    /// No git metadata; nothing to check.
    NotARepository,
    /// Protected paths deleted in the index or work tree, sorted.
    Inspected { deleted: Vec<String> },
}

impl GuardReport {
    pub fn protected_deletions(&self) -> &[String] {
        match self {
            GuardReport::NotARepository => &[],
            GuardReport::Inspected { deleted } => deleted,
        }
    }
}

/// Keep only the protected paths of `deleted`, deduplicated and sorted.
pub fn protected_deletions<I, S>(deleted: I, protected: &ProtectedPaths) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    deleted
        .into_iter()
        .filter(|p| protected.is_protected(p.as_ref()))
        .map(|p| p.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Inspects a repository for destructive pending changes.
pub struct DiffGuard {
    protected: ProtectedPaths,
}

impl DiffGuard {
    pub fn new(protected: ProtectedPaths) -> Self {
        Self { protected }
    }

    /// Union of staged and work-tree deletions that hit a protected path.
    pub fn detect_deletions(&self, repo_dir: &Path) -> Result<GuardReport> {
        if !git::is_git_repo(repo_dir)? {
            debug!(dir = %repo_dir.display(), "Not a git work tree, diff guard has nothing to check");
            return Ok(GuardReport::NotARepository);
        }
        // Deletions need a commit to delete from.
        if !git::has_head(repo_dir) {
            return Ok(GuardReport::Inspected { deleted: Vec::new() });
        }

        let prefix = git::show_prefix(repo_dir)?;
        let mut all = git::staged_deletions(repo_dir)?;
        all.extend(git::worktree_deletions(repo_dir)?);
        debug!(count = all.len(), "Pending deletions");

        let relative = all
            .iter()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(GuardReport::Inspected {
            deleted: protected_deletions(relative, &self.protected),
        })
    }
}
