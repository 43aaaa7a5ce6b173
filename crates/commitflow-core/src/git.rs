//! Thin wrapper over the `git` binary.
//!
//! Only diff/status/add/commit primitives are used; nothing here touches
//! git's object model directly.

use crate::error::{FlowError, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Diffs skip pure deletions (and type changes); binary files show only
/// git's "Binary files differ" marker.
const DIFF_FILTER: &str = "--diff-filter=ACMR";

// ---------------------------------------------------------------------------
// FileChange
// ---------------------------------------------------------------------------

/// One changed path, as reported by `git diff --name-status` or
/// `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Raw status code: `A`, `M`, `R100`, `??`, ` M`, ...
    pub status: String,
    pub path: String,
    /// Source path for renames and copies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.old_path {
            Some(old) => write!(f, "{} {} -> {}", self.status, old, self.path),
            None => write!(f, "{} {}", self.status, self.path),
        }
    }
}

/// Parse `git diff --name-status` output.
pub fn parse_name_status(out: &str) -> Vec<FileChange> {
    out.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = parts.next()?.trim().to_string();
            let first = parts.next()?.to_string();
            match parts.next() {
                Some(second) => Some(FileChange {
                    status,
                    path: second.to_string(),
                    old_path: Some(first),
                }),
                None => Some(FileChange {
                    status,
                    path: first,
                    old_path: None,
                }),
            }
        })
        .collect()
}

/// Parse `git status --porcelain` (v1) output. The two-column `XY` code is
/// kept as-is so index and worktree state stay distinguishable.
pub fn parse_porcelain(out: &str) -> Vec<FileChange> {
    out.lines()
        .filter_map(|line| {
            let status = line.get(..2)?.to_string();
            let rest = line.get(3..)?;
            if rest.is_empty() {
                return None;
            }
            match rest.split_once(" -> ") {
                Some((old, new)) => Some(FileChange {
                    status,
                    path: new.to_string(),
                    old_path: Some(old.to_string()),
                }),
                None => Some(FileChange {
                    status,
                    path: rest.to_string(),
                    old_path: None,
                }),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Subprocess helpers
// ---------------------------------------------------------------------------

fn git_output(root: &Path, args: &[&str]) -> Result<Output> {
    tracing::debug!(?args, root = %root.display(), "git");
    Command::new("git")
        .current_dir(root)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => FlowError::ToolNotFound("git".into()),
            _ => FlowError::Io(e),
        })
}

/// Run git and return stdout untrimmed. Non-zero exit becomes `FlowError::Git`
/// carrying git's stderr.
fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let output = git_output(root, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(FlowError::Git(stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn is_work_tree(root: &Path) -> Result<bool> {
    let output = git_output(root, &["rev-parse", "--is-inside-work-tree"])?;
    Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
}

pub fn require_work_tree(root: &Path) -> Result<()> {
    if is_work_tree(root)? {
        Ok(())
    } else {
        Err(FlowError::NotARepository)
    }
}

/// Index-vs-HEAD diff when `staged`, worktree-vs-index otherwise.
pub fn diff(root: &Path, staged: bool) -> Result<String> {
    let mut args = vec!["diff"];
    if staged {
        args.push("--cached");
    }
    args.extend(["--no-color", "--no-ext-diff", DIFF_FILTER]);
    run_git(root, &args)
}

pub fn staged_changes(root: &Path) -> Result<Vec<FileChange>> {
    let out = run_git(root, &["diff", "--cached", "--name-status"])?;
    Ok(parse_name_status(&out))
}

/// Every path the user would see in `git status`, including untracked files.
pub fn status_changes(root: &Path) -> Result<Vec<FileChange>> {
    let out = run_git(root, &["status", "--porcelain", "--untracked-files=all"])?;
    Ok(parse_porcelain(&out))
}

pub fn staged_paths(root: &Path) -> Result<Vec<String>> {
    let out = run_git(root, &["diff", "--cached", "--name-only"])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}

pub fn head_short_sha(root: &Path) -> Result<String> {
    Ok(run_git(root, &["rev-parse", "--short", "HEAD"])?
        .trim()
        .to_string())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Re-add tracked modifications to the index (`git add --update`).
pub fn add_tracked(root: &Path) -> Result<()> {
    run_git(root, &["add", "--update"]).map(|_| ())
}

/// `git commit -m <message>`. Hook and git output go to our stderr so it stays
/// visible without mixing into stdout. Any non-zero exit is `CommitFailed`.
pub fn commit(root: &Path, message: &str) -> Result<()> {
    tracing::debug!(root = %root.display(), "git commit");
    let status = Command::new("git")
        .current_dir(root)
        .args(["commit", "-m", message])
        .stdout(Stdio::from(std::io::stderr()))
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => FlowError::ToolNotFound("git".into()),
            _ => FlowError::CommitFailed(e.to_string()),
        })?;
    if !status.success() {
        let reason = match status.code() {
            Some(code) => format!("git exited with status {code}"),
            None => "git terminated by signal".to_string(),
        };
        return Err(FlowError::CommitFailed(reason));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------
