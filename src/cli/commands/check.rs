use anyhow::Result;

use super::helper::{load_project, runtime};
use crate::cli::{
    args::CheckCommand,
    exit_status::ExitStatus,
    report::{print_success, report, severity_counts},
};
use crate::issues::Severity;

pub fn check(cmd: CheckCommand) -> Result<ExitStatus> {
    let runtime = runtime()?;
    let project = load_project(&cmd.common, &runtime)?;

    let diagnostics = project.service.diagnostics();
    let counts = severity_counts(&diagnostics);
    let problems: usize = [Severity::Error, Severity::Warning]
        .iter()
        .filter_map(|severity| counts.get(severity))
        .sum();

    report(&diagnostics, &project.root);
    if problems == 0 {
        print_success(
            project.service.code_file_count(),
            project.service.catalog_file_count(),
        );
    }

    Ok(ExitStatus::from_problem_count(problems))
}
