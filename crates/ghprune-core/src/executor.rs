//! Best-effort batch deletion.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::Result;
use crate::version::Version;

/// Default number of deletions issued concurrently.
pub const DEFAULT_DELETE_CONCURRENCY: usize = 4;

/// Deletes one version at the remote service.
#[async_trait]
pub trait DeleteOperation: Send + Sync {
    /// Deletes `version`.
    async fn delete(&self, version: &Version) -> Result<()>;

    /// Returns true if this operation never mutates the remote service.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Delete operation that only logs what would be deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

#[async_trait]
impl DeleteOperation for DryRun {
    async fn delete(&self, version: &Version) -> Result<()> {
        tracing::info!(version = %version.summary(), "dry-run pruning");
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// A version whose deletion failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDeletion {
    /// The version that was not deleted.
    pub version: Version,

    /// Error reported by the delete operation.
    pub error: String,
}

/// Outcome of a deletion batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneOutcome {
    /// Versions deleted successfully, in input order.
    pub pruned: Vec<Version>,

    /// Versions whose deletion failed, in input order.
    pub failed: Vec<FailedDeletion>,
}

impl PruneOutcome {
    /// Returns true if every deletion succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies a [`DeleteOperation`] to every version of a list.
///
/// A failed deletion is logged and recorded but never stops the batch.
#[derive(Debug, Clone, Copy)]
pub struct PruneExecutor {
    concurrency: usize,
}

impl Default for PruneExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_DELETE_CONCURRENCY)
    }
}

impl PruneExecutor {
    /// Creates an executor issuing up to `concurrency` deletions at once.
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Deletes every version in `versions`.
    pub async fn execute<'a, I>(&self, operation: &dyn DeleteOperation, versions: I) -> PruneOutcome
    where
        I: IntoIterator<Item = &'a Version>,
    {
        let results: Vec<(&Version, Result<()>)> = stream::iter(versions)
            .map(|version| async move { (version, operation.delete(version).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = PruneOutcome::default();
        for (version, result) in results {
            match result {
                Ok(()) => outcome.pruned.push(version.clone()),
                Err(e) => {
                    tracing::warn!(
                        version_id = %version.id,
                        name = %version.name,
                        error = %e,
                        "failed to prune version"
                    );
                    outcome.failed.push(FailedDeletion {
                        version: version.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::version::VersionId;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDelete {
        fail: HashSet<VersionId>,
        calls: Mutex<Vec<VersionId>>,
    }

    #[async_trait]
    impl DeleteOperation for RecordingDelete {
        async fn delete(&self, version: &Version) -> Result<()> {
            self.calls.lock().unwrap().push(version.id);
            if self.fail.contains(&version.id) {
                return Err(Error::deletion(version.id, "403 Forbidden"));
            }
            Ok(())
        }
    }

    fn versions(n: u64) -> Vec<Version> {
        (1..=n)
            .map(|id| Version::new(id, format!("sha256:{id}"), Utc::now()))
            .collect()
    }

    fn ids(versions: &[Version]) -> Vec<u64> {
        versions.iter().map(|v| v.id.get()).collect()
    }

    #[tokio::test]
    async fn test_all_deletions_succeed() {
        let delete = RecordingDelete::default();
        let input = versions(5);

        let outcome = PruneExecutor::new(2).execute(&delete, &input).await;

        assert!(outcome.is_complete());
        assert_eq!(ids(&outcome.pruned), vec![1, 2, 3, 4, 5]);
        assert_eq!(delete.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let delete = RecordingDelete {
            fail: [VersionId::new(2), VersionId::new(4)].into_iter().collect(),
            ..RecordingDelete::default()
        };
        let input = versions(5);

        let outcome = PruneExecutor::default().execute(&delete, &input).await;

        assert!(!outcome.is_complete());
        assert_eq!(ids(&outcome.pruned), vec![1, 3, 5]);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].version.id, VersionId::new(2));
        assert!(outcome.failed[0].error.contains("403 Forbidden"));
        assert_eq!(delete.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_dry_run_prunes_everything() {
        let input = versions(3);
        let outcome = PruneExecutor::default().execute(&DryRun, &input).await;
        assert_eq!(outcome.pruned.len(), input.len());
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcome = PruneExecutor::default().execute(&DryRun, &Vec::<Version>::new()).await;
        assert!(outcome.pruned.is_empty());
        assert!(outcome.is_complete());
    }
}
