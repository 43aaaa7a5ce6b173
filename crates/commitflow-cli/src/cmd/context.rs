use crate::output::print_json;
use anyhow::Context;
use commitflow_core::{
    config::PipelineConfig,
    report::{self, ReportMode},
};
use std::path::Path;

pub fn run(root: &Path, staged_only: bool, json: bool) -> anyhow::Result<()> {
    let config = PipelineConfig::load(root).context("failed to load .commitflow.yaml")?;
    let mode = if staged_only {
        ReportMode::StagedOnly
    } else {
        ReportMode::Full
    };

    let report = report::collect(root, mode, config.diff_warning_lines)
        .context("failed to collect repository state")?;

    if json {
        print_json(&report)?;
    } else {
        print!("{}", report.render());
    }

    Ok(())
}
