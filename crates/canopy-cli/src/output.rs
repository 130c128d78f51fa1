//! Terminal rendering of plans and reports.

use canopy_core::folder::FolderPlan;
use canopy_core::{ImportReport, NodeFailure};
use colored::Colorize;

/// One line per file, numbered in processing order, followed by unreadable files.
pub(crate) fn render_plan(plan: &FolderPlan) -> Vec<String> {
	let mut lines: Vec<String> = plan
		.order()
		.into_iter()
		.enumerate()
		.map(|(index, name)| format!("{:>3}. {name}", index + 1))
		.collect();
	for error in &plan.errors {
		lines.push(format!("{} {}", "skipped:".yellow(), error.message));
	}
	lines
}

/// Multi-line summary of an import run.
pub(crate) fn render_report(report: &ImportReport) -> String {
	let mut lines = Vec::new();
	let status = if report.is_clean() {
		"Import finished".green().bold()
	} else {
		"Import finished with errors".yellow().bold()
	};
	lines.push(format!("{status}: {report}"));
	for failure in &report.failures {
		lines.push(format!("  {} {failure}", "failed:".red()));
	}
	for error in &report.file_errors {
		lines.push(format!("  {} {}", "unreadable:".red(), error.message));
	}
	for error in &report.translation_errors {
		lines.push(format!(
			"  {} line {}: {}",
			"translation:".red(),
			error.line,
			error.message
		));
	}
	lines.join("\n")
}

/// Details of the node that aborted a run.
pub(crate) fn render_failure(failure: &NodeFailure) -> String {
	[
		format!("{}", "Import aborted at".red().bold()),
		format!("  container: {}", failure.container),
		format!("  id:        {}", failure.id.as_deref().unwrap_or("-")),
		format!("  type:      {}", failure.type_name.as_deref().unwrap_or("-")),
		format!("  title:     {}", failure.title.as_deref().unwrap_or("-")),
		format!("  cause:     {}", failure.cause),
	]
	.join("\n")
}
