//! Markdown run summary.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use chrono::SecondsFormat;
use ghprune_core::{PruneReport, Version};

/// Renders the summary of a run.
#[must_use]
pub fn render(container: &str, report: &PruneReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "## Pruning versions for container: {container}\n");
    if report.dry_run {
        out.push_str(":warning: This is a dry run, no container versions were actually deleted.\n\n");
    } else {
        let status = if report.all_pruned() {
            ":white_check_mark:"
        } else {
            ":x:"
        };
        let _ = writeln!(
            out,
            "{status} {} out of {} identified versions were pruned successfully.\n",
            report.pruned.len(),
            report.intended.len()
        );
    }

    let _ = writeln!(out, "### Pruned versions\n");
    let _ = writeln!(
        out,
        "The following {} versions were successfully pruned:\n",
        report.pruned.len()
    );
    out.push_str("| ID | Name | Created at | Tags |\n");
    out.push_str("| --- | --- | --- | --- |\n");
    for version in &report.pruned {
        out.push_str(&row(version));
    }

    if !report.failed.is_empty() {
        let _ = writeln!(out, "\n### Failed versions\n");
        for failed in &report.failed {
            let _ = writeln!(
                out,
                "- `{}` ({}): {}",
                failed.version.id, failed.version.name, failed.error
            );
        }
    }

    out
}

fn row(version: &Version) -> String {
    let created_at = version
        .created_at
        .to_rfc3339_opts(SecondsFormat::Secs, true)
        .replace('T', " ");
    format!(
        "| {} | {} | {} | {} |\n",
        version.id,
        version.name,
        created_at,
        version.tags.join(", ")
    )
}

/// Appends `markdown` to `path`, or prints it when no file is configured.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn write(path: Option<&Path>, markdown: &str) -> std::io::Result<()> {
    match path {
        Some(path) => {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(markdown.as_bytes())
        }
        None => {
            println!("{markdown}");
            Ok(())
        }
    }
}
