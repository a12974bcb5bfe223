//! Outcome of a prune run.

use serde::Serialize;

use crate::executor::{FailedDeletion, PruneOutcome};
use crate::pruning_list::PruningList;
use crate::version::{Version, VersionId};

/// What a run intended to prune and what it actually pruned.
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    /// Whether deletions were simulated.
    pub dry_run: bool,

    /// Versions selected for pruning.
    pub intended: Vec<Version>,

    /// Versions pruned successfully.
    pub pruned: Vec<Version>,

    /// Versions whose deletion failed.
    pub failed: Vec<FailedDeletion>,
}

impl PruneReport {
    /// Creates a report from the final prune list and the executor outcome.
    #[must_use]
    pub fn new(intended: PruningList, outcome: PruneOutcome, dry_run: bool) -> Self {
        Self {
            dry_run,
            intended: intended.into_vec(),
            pruned: outcome.pruned,
            failed: outcome.failed,
        }
    }

    /// Returns true if every intended version was pruned.
    #[must_use]
    pub fn all_pruned(&self) -> bool {
        self.pruned.len() == self.intended.len()
    }

    /// Returns the ids of the pruned versions.
    #[must_use]
    pub fn pruned_ids(&self) -> Vec<VersionId> {
        self.pruned.iter().map(|v| v.id).collect()
    }
}
