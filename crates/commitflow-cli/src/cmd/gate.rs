use crate::output::print_json;
use anyhow::Context;
use commitflow_core::{
    config::PipelineConfig,
    gate::{self, GateExecutor, GateOutcome, GateScript, GateStatus, Project},
    git,
    package_manager::PackageManager,
    FlowError,
};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

pub fn run(root: &Path, skip_tests: bool, json: bool) -> anyhow::Result<()> {
    let config = PipelineConfig::load(root).context("failed to load .commitflow.yaml")?;
    let skip_tests = skip_tests || config.skip_tests;

    let Some(project) = Project::load(root).context("failed to read package.json")? else {
        let outcome = GateOutcome::Neutral {
            reason: "no package.json".to_string(),
        };
        if json {
            print_json(&outcome)?;
        } else {
            println!("No package.json found, nothing to check");
        }
        return Ok(());
    };

    let needs_manager =
        gate::planned_scripts(skip_tests).any(|s| project.manifest.has_script(s.name));
    if needs_manager && !project.manager.is_installed() {
        return Err(FlowError::ToolNotFound(project.manager.binary().to_string()).into());
    }

    let mut exec = ProcessExecutor {
        root: root.to_path_buf(),
        manager: project.manager,
        timeout: config.gate_timeout(),
        json,
    };
    let outcome = gate::run_gates(project.manager, &project.manifest, skip_tests, &mut exec)?;

    if json {
        print_json(&outcome)?;
    } else {
        print_summary(&outcome);
    }

    outcome.into_result()?;
    Ok(())
}

fn print_summary(outcome: &GateOutcome) {
    for r in outcome.results() {
        match r.status {
            GateStatus::Passed if r.restaged => {
                println!("✓ {} ({}ms, changes re-staged)", r.display_name, r.duration_ms)
            }
            GateStatus::Passed => println!("✓ {} ({}ms)", r.display_name, r.duration_ms),
            GateStatus::Skipped => println!("- {}: no '{}' script, skipped", r.display_name, r.script),
            GateStatus::Failed => println!("✗ {} failed", r.display_name),
        }
    }
    if outcome.is_success() {
        println!("All checks passed");
    }
}

// ---------------------------------------------------------------------------
// ProcessExecutor
// ---------------------------------------------------------------------------

/// Runs gate scripts through the package manager with inherited stdio, so
/// script output appears verbatim. In JSON mode script stdout is sent to our
/// stderr to keep stdout parseable.
///
/// With a timeout configured each script gets its own process group, so the
/// shells and tools the package manager spawns are killed along with it.
struct ProcessExecutor {
    root: PathBuf,
    manager: PackageManager,
    timeout: Option<Duration>,
    json: bool,
}

impl GateExecutor for ProcessExecutor {
    fn run_script(&mut self, script: &GateScript) -> commitflow_core::Result<bool> {
        if !self.json {
            println!(
                "→ {} ({} run {})",
                script.display_name, self.manager, script.name
            );
        }

        let mut cmd = self.manager.run_command(script.name, &self.root);
        if self.timeout.is_some() {
            own_process_group(&mut cmd);
        }
        if self.json {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }
        let child = cmd.spawn().map_err(|e| {
            FlowError::ScriptSpawnFailed(format!("{} run {}: {e}", self.manager, script.name))
        })?;

        match wait_with_timeout(child, self.timeout)? {
            Some(status) => Ok(status.success()),
            None => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                tracing::warn!(script = script.name, secs, "gate script timed out");
                eprintln!("{} timed out after {secs}s", script.display_name);
                Ok(false)
            }
        }
    }

    fn restage(&mut self) -> commitflow_core::Result<bool> {
        if !git::is_work_tree(&self.root)? {
            tracing::debug!(root = %self.root.display(), "not a git repository, nothing to re-stage");
            return Ok(false);
        }
        git::add_tracked(&self.root)?;
        Ok(true)
    }
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Wait for `child`, killing it and its process group once `timeout` elapses.
/// `Ok(None)` on timeout.
///
/// The child moves to a waiter thread and we block on `recv_timeout`, so there
/// is no polling. `None` timeout means wait indefinitely.
fn wait_with_timeout(
    mut child: Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let pid = child.id();
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(child.wait());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map(Some),
        Err(_) => {
            kill_process_group(pid);
            Ok(None)
        }
    }
}

/// SIGKILL the process group led by `pid` (`kill -9 -- -<pgid>`). The child
/// must have been spawned through `own_process_group`. Best-effort; errors
/// are silently ignored.
fn kill_process_group(pid: u32) {
    let group = format!("-{pid}");
    let _ = Command::new("kill")
        .args(["-9", "--", group.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}
