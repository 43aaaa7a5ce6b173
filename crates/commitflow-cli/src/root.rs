use std::path::{Path, PathBuf};

/// Resolve the invocation root.
///
/// Priority:
/// 1. `--root` flag / `COMMITFLOW_ROOT` env var (passed in as `explicit`)
/// 2. The current working directory
///
/// No upward search: the manifest and lint config are looked up at the
/// invocation root only, and git finds its own repository from there.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
