use crate::error::{FlowError, Result};
use crate::git;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitSummary {
    /// Short sha of the new HEAD.
    pub commit: String,
    pub files: usize,
}

/// Commit the current index with `message`, passed to git unchanged.
///
/// Checks run in order and nothing touches git until the message check
/// passes: empty message → `MissingMessage`, empty index → `NothingStaged`,
/// git refusing the commit (hooks, identity, ...) → `CommitFailed`.
pub fn commit(root: &Path, message: &str) -> Result<CommitSummary> {
    if message.trim().is_empty() {
        return Err(FlowError::MissingMessage);
    }

    let staged = git::staged_paths(root)?;
    if staged.is_empty() {
        return Err(FlowError::NothingStaged);
    }
    tracing::info!(files = staged.len(), "committing staged changes");

    git::commit(root, message)?;
    let commit = git::head_short_sha(root)?;
    Ok(CommitSummary {
        commit,
        files: staged.len(),
    })
}
