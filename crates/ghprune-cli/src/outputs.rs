//! Step outputs.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use ghprune_core::PruneReport;

/// Values exposed to later workflow steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    /// Number of versions pruned.
    pub count: usize,

    /// Ids of the pruned versions.
    pub pruned_version_ids: Vec<u64>,

    /// Whether the run was a dry run.
    pub dry_run: bool,
}

impl Outputs {
    /// Collects the outputs of a run.
    #[must_use]
    pub fn from_report(report: &PruneReport) -> Self {
        Self {
            count: report.pruned.len(),
            pruned_version_ids: report.pruned_ids().into_iter().map(|id| id.get()).collect(),
            dry_run: report.dry_run,
        }
    }

    /// Returns the `name=value` lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let ids = serde_json::to_string(&self.pruned_version_ids).unwrap_or_else(|_| "[]".to_string());
        vec![
            format!("count={}", self.count),
            format!("prunedVersionIds={ids}"),
            format!("dryRun={}", self.dry_run),
        ]
    }

    /// Appends the outputs to `path`, or prints them when no file is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn write(&self, path: Option<&Path>) -> std::io::Result<()> {
        let mut text = self.lines().join("\n");
        text.push('\n');

        match path {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(text.as_bytes())
            }
            None => {
                print!("{text}");
                Ok(())
            }
        }
    }
}
