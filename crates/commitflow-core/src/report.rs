//! Repository state report handed to commit-message generation.
//!
//! The text rendering has stable section headers (`FILES CHANGED`,
//! `DIFF (<n> lines)`, `COMMITLINT CONFIG`) so the consumer can find each
//! part; exact spacing is not part of the contract.

use crate::error::{FlowError, Result};
use crate::git::{self, FileChange};
use crate::paths;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Index vs HEAD only.
    StagedOnly,
    /// Index followed by working tree; file list from `git status`.
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintConfig {
    pub file: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub mode: ReportMode,
    pub files_changed: Vec<FileChange>,
    pub diff_text: String,
    pub line_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint_config: Option<LintConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DiffReport {
    /// Assemble a report from already-gathered parts.
    ///
    /// Fails with `NoChanges` when both the diff and the file list are empty.
    /// A diff strictly longer than `warn_threshold` lines carries a warning.
    pub fn build(
        mode: ReportMode,
        files_changed: Vec<FileChange>,
        diff_text: String,
        lint_config: Option<LintConfig>,
        warn_threshold: usize,
    ) -> Result<Self> {
        if files_changed.is_empty() && diff_text.trim().is_empty() {
            return Err(FlowError::NoChanges);
        }
        let line_count = diff_text.lines().count();
        let warning = (line_count > warn_threshold).then(|| {
            format!(
                "WARNING: diff is {line_count} lines (over {warn_threshold}); summarize the changes rather than reading every line"
            )
        });
        Ok(Self {
            mode,
            files_changed,
            diff_text,
            line_count,
            lint_config,
            warning,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("FILES CHANGED\n");
        for change in &self.files_changed {
            let _ = writeln!(out, "{change}");
        }
        let _ = writeln!(out, "\nDIFF ({} lines)", self.line_count);
        if !self.diff_text.is_empty() {
            out.push_str(&self.diff_text);
            if !self.diff_text.ends_with('\n') {
                out.push('\n');
            }
        }
        if let Some(cfg) = &self.lint_config {
            let _ = writeln!(out, "\nCOMMITLINT CONFIG ({})", cfg.file);
            out.push_str(&cfg.content);
            if !cfg.content.ends_with('\n') {
                out.push('\n');
            }
        }
        if let Some(warning) = &self.warning {
            let _ = writeln!(out, "\n{warning}");
        }
        out
    }
}

/// Read the first conventional lint config under `root`, if any.
pub fn read_lint_config(root: &Path) -> Result<Option<LintConfig>> {
    let Some(path) = paths::find_lint_config(root) else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(&path)?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Some(LintConfig { file, content }))
}

/// Gather diff, file list and lint config for the repository at `root`.
pub fn collect(root: &Path, mode: ReportMode, warn_threshold: usize) -> Result<DiffReport> {
    git::require_work_tree(root)?;

    let staged = git::diff(root, true)?;
    let (files, diff_text) = match mode {
        ReportMode::StagedOnly => (git::staged_changes(root)?, staged.trim_end().to_string()),
        ReportMode::Full => {
            let unstaged = git::diff(root, false)?;
            let diff_text = [staged.trim_end(), unstaged.trim_end()]
                .into_iter()
                .filter(|d| !d.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (git::status_changes(root)?, diff_text)
        }
    };
    tracing::debug!(?mode, files = files.len(), "collected repository state");

    let lint_config = read_lint_config(root)?;
    DiffReport::build(mode, files, diff_text, lint_config, warn_threshold)
}
