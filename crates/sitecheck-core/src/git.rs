//! Git plumbing used by the diff guard.

use std::path::Path;
use std::process::Command;

use crate::domain::{Result, SiteCheckError};

/// Run `git <args>` in `repo_dir` and return stdout.
fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| SiteCheckError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SiteCheckError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check whether a directory is inside a git work tree.
///
/// `Ok(false)` only when git itself says so. A missing git binary or any
/// other refusal (dubious ownership, a corrupt `.git`) is an error.
pub fn is_git_repo(dir: &Path) -> Result<bool> {
    let output = Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map_err(|e| SiteCheckError::Git(format!("failed to run git: {e}")))?;

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim() == "true");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_not_a_repository(&stderr) {
        Ok(false)
    } else {
        Err(SiteCheckError::Git(format!(
            "git rev-parse --is-inside-work-tree failed: {}",
            stderr.trim()
        )))
    }
}

fn is_not_a_repository(stderr: &str) -> bool {
    stderr.contains("not a git repository")
}

/// Whether the repository has at least one commit.
pub fn has_head(repo_dir: &Path) -> bool {
    run_git(repo_dir, &["rev-parse", "--verify", "--quiet", "HEAD"]).is_ok()
}

/// Location of `repo_dir` below the work tree root, e.g. `"site/"`; empty at the root.
///
/// `git diff --name-only` reports paths from the root, so callers strip this prefix.
pub fn show_prefix(repo_dir: &Path) -> Result<String> {
    Ok(run_git(repo_dir, &["rev-parse", "--show-prefix"])?.trim().to_string())
}

/// Files deleted in the index relative to HEAD (about to be committed).
pub fn staged_deletions(repo_dir: &Path) -> Result<Vec<String>> {
    let out = run_git(
        repo_dir,
        &[
            "-c",
            "core.quotePath=false",
            "diff",
            "--cached",
            "--name-only",
            "-z",
            "--diff-filter=D",
            "--no-renames",
        ],
    )?;
    Ok(parse_name_list(&out))
}

/// Files deleted in the work tree relative to HEAD, staged or not.
pub fn worktree_deletions(repo_dir: &Path) -> Result<Vec<String>> {
    let out = run_git(
        repo_dir,
        &[
            "-c",
            "core.quotePath=false",
            "diff",
            "HEAD",
            "--name-only",
            "-z",
            "--diff-filter=D",
            "--no-renames",
        ],
    )?;
    Ok(parse_name_list(&out))
}

/// Split `-z` output. Paths are verbatim: no quoting, no trimming.
fn parse_name_list(out: &str) -> Vec<String> {
    out.split('\0')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "--quiet"]);
        git(dir.path(), &["config", "user.name", "test-user"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        git(dir.path(), &["config", "commit.gpgsign", "false"]);
        dir
    }

    #[test]
    fn is_git_repo_true_for_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()).unwrap());
    }

    #[test]
    fn is_git_repo_false_for_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()).unwrap());
    }

    #[test]
    fn is_git_repo_errors_on_corrupt_gitfile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".git"), "this is not a gitdir\n").unwrap();
        let err = is_git_repo(dir.path()).unwrap_err();
        assert!(matches!(err, SiteCheckError::Git(_)), "{err}");
    }

    #[test]
    fn only_not_a_repository_counts_as_outside_git() {
        assert!(is_not_a_repository(
            "fatal: not a git repository (or any of the parent directories): .git\n"
        ));
        assert!(!is_not_a_repository(
            "fatal: detected dubious ownership in repository at '/srv/site'\n"
        ));
        assert!(!is_not_a_repository("fatal: invalid gitfile format: /srv/site/.git\n"));
    }

    #[test]
    fn name_list_keeps_non_ascii_and_spaces() {
        let out = "episodes/caf\u{e9}-\u{e9}pisode/index.html\0notes/a b.txt\0";
        assert_eq!(
            parse_name_list(out),
            vec![
                "episodes/caf\u{e9}-\u{e9}pisode/index.html".to_string(),
                "notes/a b.txt".to_string()
            ]
        );
    }

    #[test]
    fn has_head_false_before_first_commit() {
        let repo = make_git_repo();
        assert!(!has_head(repo.path()));
        git(repo.path(), &["commit", "--allow-empty", "-m", "initial"]);
        assert!(has_head(repo.path()));
    }

    #[test]
    fn staged_and_unstaged_deletions_are_listed() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("style.css"), "body {}").unwrap();
        std::fs::write(repo.path().join("robots.txt"), "User-agent: *").unwrap();
        git(repo.path(), &["add", "."]);
        git(repo.path(), &["commit", "-m", "initial"]);

        git(repo.path(), &["rm", "--quiet", "style.css"]);
        std::fs::remove_file(repo.path().join("robots.txt")).unwrap();

        assert_eq!(staged_deletions(repo.path()).unwrap(), vec!["style.css"]);
        let mut worktree = worktree_deletions(repo.path()).unwrap();
        worktree.sort();
        assert_eq!(worktree, vec!["robots.txt", "style.css"]);
    }

    #[test]
    fn parse_name_list_handles_empty_output() {
        assert!(parse_name_list("").is_empty());
        assert_eq!(parse_name_list("a\0 b \0"), vec!["a", " b "]);
    }
}
