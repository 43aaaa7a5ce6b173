use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Per-invocation settings, read once from `.commitflow.yaml` and passed to
/// each stage. A missing file yields the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Diffs longer than this many lines get an advisory warning.
    #[serde(default = "default_diff_warning_lines")]
    pub diff_warning_lines: usize,
    /// Per-script ceiling. `0` waits indefinitely.
    #[serde(default)]
    pub gate_timeout_seconds: u64,
    #[serde(default)]
    pub skip_tests: bool,
}

fn default_diff_warning_lines() -> usize {
    1000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            diff_warning_lines: default_diff_warning_lines(),
            gate_timeout_seconds: 0,
            skip_tests: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: PipelineConfig = serde_yaml::from_str(&data)?;
        tracing::debug!(path = %path.display(), ?cfg, "loaded pipeline config");
        Ok(cfg)
    }

    pub fn gate_timeout(&self) -> Option<Duration> {
        if self.gate_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.gate_timeout_seconds))
        }
    }
}
