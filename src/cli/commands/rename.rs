use anyhow::Result;

use super::helper::{load_project, runtime};
use crate::cli::{args::RenameCommand, exit_status::ExitStatus, report::print_rename};

/// Rename a key. Dry-run unless `--apply` is given; a conflict is an error.
pub fn rename(cmd: RenameCommand) -> Result<ExitStatus> {
    let runtime = runtime()?;
    let project = load_project(&cmd.common, &runtime)?;

    let edits = if cmd.apply {
        project.service.rename(&cmd.old, &cmd.new)?
    } else {
        project.service.plan_rename(&cmd.old, &cmd.new)?
    };
    print_rename(&cmd.old, &cmd.new, &edits, &project.root, cmd.apply);

    Ok(ExitStatus::Success)
}
