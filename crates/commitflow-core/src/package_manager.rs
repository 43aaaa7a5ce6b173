//! Package manager detection by lockfile.
//!
//! # Priority
//! 1. `package-lock.json` → npm
//! 2. `yarn.lock`         → yarn
//! 3. `pnpm-lock.yaml`    → pnpm
//! 4. `bun.lockb` / `bun.lock` → bun
//! 5. manifest present, no lockfile → npm
//! 6. otherwise none

use serde::Serialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

const LOCKFILES: &[(&str, PackageManager)] = &[
    ("package-lock.json", PackageManager::Npm),
    ("yarn.lock", PackageManager::Yarn),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
];

impl PackageManager {
    /// Executable name, also used for display.
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// `<manager> run <script>`, rooted at `root`.
    pub fn run_command(&self, script: &str, root: &Path) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.args(["run", script]).current_dir(root);
        cmd
    }

    pub fn is_installed(&self) -> bool {
        which::which(self.binary()).is_ok()
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Manager named by the highest-priority lockfile under `root`, if any.
pub fn from_lockfile(root: &Path) -> Option<PackageManager> {
    LOCKFILES
        .iter()
        .find(|(lockfile, _)| root.join(lockfile).is_file())
        .map(|(_, manager)| *manager)
}

/// Detection for a project with a manifest: the lockfile's manager, else npm.
/// Without a manifest there is nothing to detect (see `gate::Project::load`).
pub fn detect_with_manifest(root: &Path) -> PackageManager {
    from_lockfile(root).unwrap_or(PackageManager::Npm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        std::fs::write(dir.path().join(name), "").unwrap();
    }

    #[test]
    fn single_lockfile_selects_its_manager() {
        for (lockfile, expected) in LOCKFILES {
            let dir = TempDir::new().unwrap();
            touch(&dir, lockfile);
            assert_eq!(detect_with_manifest(dir.path()), *expected, "{lockfile}");
        }
    }

    #[test]
    fn highest_priority_lockfile_wins() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "bun.lockb");
        touch(&dir, "pnpm-lock.yaml");
        touch(&dir, "yarn.lock");
        assert_eq!(detect_with_manifest(dir.path()), PackageManager::Yarn);

        touch(&dir, "package-lock.json");
        assert_eq!(detect_with_manifest(dir.path()), PackageManager::Npm);
    }

    #[test]
    fn pnpm_beats_bun() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "bun.lock");
        touch(&dir, "pnpm-lock.yaml");
        assert_eq!(detect_with_manifest(dir.path()), PackageManager::Pnpm);
    }

    #[test]
    fn manifest_without_lockfile_defaults_to_npm() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect_with_manifest(dir.path()), PackageManager::Npm);
    }

    #[test]
    fn lockfile_alone_is_detected() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "yarn.lock");
        assert_eq!(from_lockfile(dir.path()), Some(PackageManager::Yarn));
    }

    #[test]
    fn nothing_present_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(from_lockfile(dir.path()), None);
    }

    #[test]
    fn run_command_shape() {
        let cmd = PackageManager::Pnpm.run_command("lint", Path::new("/tmp"));
        assert_eq!(cmd.get_program(), "pnpm");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["run", "lint"]);
    }
}
