use crate::error::{FlowError, Result};
use crate::manifest::Manifest;
use crate::package_manager::{self, PackageManager};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// GateScript
// ---------------------------------------------------------------------------

/// A named quality check looked up in the manifest's `scripts` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateScript {
    pub name: &'static str,
    pub display_name: &'static str,
    /// Re-stage tracked files after a successful run (the script may have
    /// rewritten them in place).
    pub restage: bool,
}

pub static GATE_SCRIPTS: [GateScript; 4] = [
    GateScript {
        name: "format",
        display_name: "Format",
        restage: true,
    },
    GateScript {
        name: "typecheck",
        display_name: "Type check",
        restage: false,
    },
    GateScript {
        name: "lint",
        display_name: "Lint",
        restage: true,
    },
    GateScript {
        name: "test",
        display_name: "Tests",
        restage: false,
    },
];

/// The scripts to consider, in execution order.
pub fn planned_scripts(skip_tests: bool) -> impl Iterator<Item = &'static GateScript> {
    GATE_SCRIPTS
        .iter()
        .filter(move |s| !(skip_tests && s.name == "test"))
}

// ---------------------------------------------------------------------------
// GateExecutor
// ---------------------------------------------------------------------------

/// Runs scripts and re-stages the index on behalf of `run_gates`.
pub trait GateExecutor {
    /// Run `script` to completion. `Ok(false)` means it reported failure.
    fn run_script(&mut self, script: &GateScript) -> Result<bool>;
    /// Re-add rewritten files to the index. `Ok(false)` when there is no
    /// index to update (the project is not inside a git repository).
    fn restage(&mut self) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Passed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub script: String,
    pub display_name: String,
    pub status: GateStatus,
    pub restaged: bool,
    pub duration_ms: u64,
}

/// Overall result of one gate-runner invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    /// No manifest, so nothing to check. Counts as success.
    Neutral { reason: String },
    Passed {
        manager: PackageManager,
        results: Vec<GateResult>,
    },
    Failed {
        manager: PackageManager,
        failed: String,
        results: Vec<GateResult>,
    },
}

impl GateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, GateOutcome::Failed { .. })
    }

    pub fn results(&self) -> &[GateResult] {
        match self {
            GateOutcome::Neutral { .. } => &[],
            GateOutcome::Passed { results, .. } | GateOutcome::Failed { results, .. } => results,
        }
    }

    /// Convert a failed outcome into `FlowError::GateFailed`.
    pub fn into_result(self) -> Result<Self> {
        if let GateOutcome::Failed { failed, .. } = &self {
            let display_name = GATE_SCRIPTS
                .iter()
                .find(|s| s.name == failed)
                .map(|s| s.display_name)
                .unwrap_or(failed.as_str())
                .to_string();
            return Err(FlowError::GateFailed {
                script: failed.clone(),
                display_name,
            });
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// What the gate runner needs to know about the project at the invocation root.
#[derive(Debug, Clone)]
pub struct Project {
    pub manager: PackageManager,
    pub manifest: Manifest,
}

impl Project {
    /// Load the manifest and detect the manager. `Ok(None)` when there is no
    /// manifest, which the gate runner treats as nothing to check.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let Some(manifest) = Manifest::load(root)? else {
            tracing::info!(root = %root.display(), "no manifest, nothing to check");
            return Ok(None);
        };
        let manager = package_manager::detect_with_manifest(root);
        tracing::info!(%manager, "detected package manager");
        Ok(Some(Self { manager, manifest }))
    }
}

// ---------------------------------------------------------------------------
// run_gates
// ---------------------------------------------------------------------------

/// Run each declared gate in order, stopping at the first failure.
///
/// Scripts missing from the manifest are recorded as skipped and never
/// reach the executor. A failed script is never followed by a re-stage,
/// even when its `restage` flag is set.
pub fn run_gates(
    manager: PackageManager,
    manifest: &Manifest,
    skip_tests: bool,
    exec: &mut dyn GateExecutor,
) -> Result<GateOutcome> {
    let mut results = Vec::new();

    for script in planned_scripts(skip_tests) {
        if !manifest.has_script(script.name) {
            tracing::debug!(script = script.name, "not declared, skipping");
            results.push(GateResult {
                script: script.name.to_string(),
                display_name: script.display_name.to_string(),
                status: GateStatus::Skipped,
                restaged: false,
                duration_ms: 0,
            });
            continue;
        }

        let start = std::time::Instant::now();
        let passed = exec.run_script(script)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !passed {
            tracing::info!(script = script.name, "gate failed");
            results.push(GateResult {
                script: script.name.to_string(),
                display_name: script.display_name.to_string(),
                status: GateStatus::Failed,
                restaged: false,
                duration_ms,
            });
            return Ok(GateOutcome::Failed {
                manager,
                failed: script.name.to_string(),
                results,
            });
        }

        let restaged = script.restage && exec.restage()?;

        results.push(GateResult {
            script: script.name.to_string(),
            display_name: script.display_name.to_string(),
            status: GateStatus::Passed,
            restaged,
            duration_ms,
        });
    }

    Ok(GateOutcome::Passed { manager, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::Command;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq)]
    enum Event {
        Ran(&'static str),
        Restaged,
    }

    /// Records calls; scripts named in `failing` report failure.
    struct Recorder {
        failing: Vec<&'static str>,
        events: Vec<Event>,
        has_index: bool,
    }

    impl Default for Recorder {
        fn default() -> Self {
            Self {
                failing: Vec::new(),
                events: Vec::new(),
                has_index: true,
            }
        }
    }

    impl GateExecutor for Recorder {
        fn run_script(&mut self, script: &GateScript) -> Result<bool> {
            self.events.push(Event::Ran(script.name));
            Ok(!self.failing.contains(&script.name))
        }

        fn restage(&mut self) -> Result<bool> {
            self.events.push(Event::Restaged);
            Ok(self.has_index)
        }
    }

    fn manifest(scripts: &[&str]) -> Manifest {
        let mut m = Manifest::default();
        for s in scripts {
            m.scripts.insert(s.to_string(), format!("echo {s}"));
        }
        m
    }

    #[test]
    fn all_declared_scripts_run_in_fixed_order() {
        let mut rec = Recorder::default();
        let m = manifest(&["test", "lint", "typecheck", "format"]);
        let outcome = run_gates(PackageManager::Npm, &m, false, &mut rec).unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            rec.events,
            vec![
                Event::Ran("format"),
                Event::Restaged,
                Event::Ran("typecheck"),
                Event::Ran("lint"),
                Event::Restaged,
                Event::Ran("test"),
            ]
        );
    }

    #[test]
    fn undeclared_scripts_are_skipped_and_do_not_fail() {
        let mut rec = Recorder::default();
        let m = manifest(&["lint"]);
        let outcome = run_gates(PackageManager::Yarn, &m, false, &mut rec).unwrap();

        assert!(matches!(outcome, GateOutcome::Passed { .. }));
        assert_eq!(rec.events, vec![Event::Ran("lint"), Event::Restaged]);
        let statuses: Vec<_> = outcome.results().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                GateStatus::Skipped,
                GateStatus::Skipped,
                GateStatus::Passed,
                GateStatus::Skipped
            ]
        );
    }

    #[test]
    fn empty_script_table_passes() {
        let mut rec = Recorder::default();
        let outcome = run_gates(PackageManager::Npm, &manifest(&[]), false, &mut rec).unwrap();
        assert!(outcome.is_success());
        assert!(rec.events.is_empty());
    }

    #[test]
    fn first_failure_stops_the_sequence() {
        let mut rec = Recorder {
            failing: vec!["typecheck"],
            ..Default::default()
        };
        let m = manifest(&["format", "typecheck", "lint", "test"]);
        let outcome = run_gates(PackageManager::Pnpm, &m, false, &mut rec).unwrap();

        assert_eq!(
            rec.events,
            vec![Event::Ran("format"), Event::Restaged, Event::Ran("typecheck")]
        );
        match &outcome {
            GateOutcome::Failed { failed, results, .. } => {
                assert_eq!(failed, "typecheck");
                assert_eq!(results.len(), 2);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, FlowError::GateFailed { ref display_name, .. } if display_name == "Type check"));
    }

    #[test]
    fn failed_restaging_script_does_not_restage() {
        let mut rec = Recorder {
            failing: vec!["format"],
            ..Default::default()
        };
        let outcome =
            run_gates(PackageManager::Npm, &manifest(&["format"]), false, &mut rec).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(rec.events, vec![Event::Ran("format")]);
        assert!(!outcome.results()[0].restaged);
    }

    #[test]
    fn restage_without_index_is_not_reported() {
        let mut rec = Recorder {
            has_index: false,
            ..Default::default()
        };
        let outcome =
            run_gates(PackageManager::Npm, &manifest(&["format"]), false, &mut rec).unwrap();
        assert!(outcome.is_success());
        assert_eq!(rec.events, vec![Event::Ran("format"), Event::Restaged]);
        assert!(!outcome.results()[0].restaged);
    }

    #[test]
    fn non_restaging_script_never_restages() {
        let mut rec = Recorder::default();
        let outcome = run_gates(
            PackageManager::Bun,
            &manifest(&["typecheck", "test"]),
            false,
            &mut rec,
        )
        .unwrap();
        assert!(outcome.is_success());
        assert!(!rec.events.contains(&Event::Restaged));
    }

    #[test]
    fn skip_tests_never_checks_test() {
        let mut rec = Recorder::default();
        let m = manifest(&["test"]);
        let outcome = run_gates(PackageManager::Npm, &m, true, &mut rec).unwrap();
        assert!(rec.events.is_empty());
        assert!(outcome.results().iter().all(|r| r.script != "test"));
    }

    /// Runs each manifest script body through `sh -c` in `root`.
    struct ShellExecutor {
        root: PathBuf,
        manifest: Manifest,
    }

    impl GateExecutor for ShellExecutor {
        fn run_script(&mut self, script: &GateScript) -> Result<bool> {
            let body = self
                .manifest
                .scripts
                .get(script.name)
                .map(String::as_str)
                .unwrap_or("true");
            let status = Command::new("sh")
                .arg("-c")
                .arg(body)
                .current_dir(&self.root)
                .status()?;
            Ok(status.success())
        }

        fn restage(&mut self) -> Result<bool> {
            Ok(false)
        }
    }

    fn marker(root: &Path) -> PathBuf {
        root.join("typecheck-ran")
    }

    #[test]
    fn failing_first_gate_leaves_no_marker_from_second() {
        let dir = TempDir::new().unwrap();
        let m = Manifest::parse(
            r#"{"scripts":{"format":"exit 1","typecheck":"touch typecheck-ran"}}"#,
        )
        .unwrap();
        let mut exec = ShellExecutor {
            root: dir.path().to_path_buf(),
            manifest: m.clone(),
        };

        let outcome = run_gates(PackageManager::Npm, &m, false, &mut exec).unwrap();
        assert!(!outcome.is_success());
        assert!(!marker(dir.path()).exists());
    }

    #[test]
    fn passing_first_gate_lets_second_run() {
        let dir = TempDir::new().unwrap();
        let m = Manifest::parse(
            r#"{"scripts":{"format":"true","typecheck":"touch typecheck-ran"}}"#,
        )
        .unwrap();
        let mut exec = ShellExecutor {
            root: dir.path().to_path_buf(),
            manifest: m.clone(),
        };

        let outcome = run_gates(PackageManager::Npm, &m, false, &mut exec).unwrap();
        assert!(outcome.is_success());
        assert!(marker(dir.path()).exists());
    }

    #[test]
    fn project_without_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        assert!(Project::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn project_detects_manager_from_lockfile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"scripts":{}}"#).unwrap();
        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let project = Project::load(dir.path()).unwrap().unwrap();
        assert_eq!(project.manager, PackageManager::Pnpm);
    }

    #[test]
    fn outcome_json_is_tagged() {
        let outcome = GateOutcome::Neutral {
            reason: "no package.json".into(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"outcome\":\"neutral\""));
    }
}
