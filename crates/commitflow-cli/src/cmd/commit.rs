use crate::output::print_json;
use anyhow::Context;
use commitflow_core::commit;
use std::path::Path;

pub fn run(root: &Path, message: Option<&str>, json: bool) -> anyhow::Result<()> {
    let summary = commit::commit(root, message.unwrap_or_default()).context("commit aborted")?;

    if json {
        print_json(&summary)?;
    } else {
        let plural = if summary.files == 1 { "" } else { "s" };
        println!(
            "Committed {} ({} file{plural})",
            summary.commit, summary.files
        );
    }

    Ok(())
}
