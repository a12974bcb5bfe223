//! Run orchestration.
//!
//! The [`Pruner`] ties the pieces together: it enumerates every version of the
//! container, builds the base prune list, applies the multi-arch handling
//! selected by [`MultiArchMode`], and finally hands the list to a
//! [`PruneExecutor`].
//!
//! Planning performs no deletion, so any enumeration or manifest failure
//! aborts the run before the remote service is mutated.

use async_trait::async_trait;
use serde::Serialize;

use crate::candidates::CandidateListBuilder;
use crate::error::{Error, Result};
use crate::executor::{DeleteOperation, PruneExecutor, DEFAULT_DELETE_CONCURRENCY};
use crate::manifest::ManifestResolver;
use crate::multiarch::{MultiArchExpander, DEFAULT_RESOLVE_CONCURRENCY};
use crate::policy::RetentionPolicy;
use crate::pruning_list::PruningList;
use crate::report::PruneReport;
use crate::version::Version;

/// Source of the full version enumeration of one container.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Lists every version of the container.
    async fn list_versions(&self) -> Result<Vec<Version>>;
}

/// How multi-arch images are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiArchMode {
    /// Manifests are not inspected.
    #[default]
    Ignore,

    /// Untagged children of pruned multi-arch tags are pruned as well.
    DeleteChildren,

    /// Untagged children of any tagged multi-arch image are never pruned.
    ProtectChildren,
}

impl MultiArchMode {
    /// Selects the mode from the `remove-multi-platform` and `prune-untagged`
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if both are enabled.
    pub fn select(remove_multi_platform: bool, prune_untagged: bool) -> Result<Self> {
        match (remove_multi_platform, prune_untagged) {
            (true, true) => Err(Error::invalid_config(
                "remove-multi-platform and prune-untagged are mutually exclusive",
            )),
            (true, false) => Ok(Self::DeleteChildren),
            (false, true) => Ok(Self::ProtectChildren),
            (false, false) => Ok(Self::Ignore),
        }
    }

    /// Returns true if this mode needs a manifest resolver.
    #[must_use]
    pub const fn needs_manifests(self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// The versions a run is going to prune, and how the list came about.
#[derive(Debug, Clone, Serialize)]
pub struct PrunePlan {
    /// Number of versions in the container.
    pub total_versions: usize,

    /// Candidates selected by the retention policy.
    pub base: PruningList,

    /// Untagged children added because their multi-arch tag is pruned.
    pub added_children: Vec<Version>,

    /// Untagged candidates dropped because a kept tag references them.
    pub protected: Vec<Version>,

    /// Final list handed to the executor.
    pub versions: PruningList,
}

/// Plans and executes a prune run for one container.
pub struct Pruner<'a> {
    source: &'a dyn VersionSource,
    resolver: Option<&'a dyn ManifestResolver>,
    policy: RetentionPolicy,
    candidates: CandidateListBuilder,
    mode: MultiArchMode,
    resolve_concurrency: usize,
    executor: PruneExecutor,
}

impl<'a> Pruner<'a> {
    /// Creates a pruner reading versions from `source`.
    #[must_use]
    pub fn new(source: &'a dyn VersionSource, policy: RetentionPolicy) -> Self {
        Self {
            source,
            resolver: None,
            policy,
            candidates: CandidateListBuilder::default(),
            mode: MultiArchMode::Ignore,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            executor: PruneExecutor::new(DEFAULT_DELETE_CONCURRENCY),
        }
    }

    /// Exempts the `keep_last` most recent versions.
    #[must_use]
    pub const fn keep_last(mut self, keep_last: usize) -> Self {
        self.candidates = CandidateListBuilder::new(keep_last);
        self
    }

    /// Enables multi-arch handling backed by `resolver`.
    #[must_use]
    pub fn multi_arch(mut self, mode: MultiArchMode, resolver: &'a dyn ManifestResolver) -> Self {
        self.mode = mode;
        self.resolver = Some(resolver);
        self
    }

    /// Sets the number of manifests resolved concurrently.
    #[must_use]
    pub const fn resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.resolve_concurrency = concurrency;
        self
    }

    /// Sets the number of deletions issued concurrently.
    #[must_use]
    pub fn delete_concurrency(mut self, concurrency: usize) -> Self {
        self.executor = PruneExecutor::new(concurrency);
        self
    }

    /// Returns the multi-arch mode.
    #[must_use]
    pub const fn mode(&self) -> MultiArchMode {
        self.mode
    }

    /// Computes the versions to prune without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the versions cannot be listed, a manifest cannot be
    /// resolved, or multi-arch handling is enabled without a resolver.
    pub async fn plan(&self) -> Result<PrunePlan> {
        let versions = self.source.list_versions().await?;
        tracing::info!(count = versions.len(), "enumerated container versions");

        let base = self
            .candidates
            .build(&versions, |v| self.policy.should_prune(v));
        tracing::info!(
            candidates = base.len(),
            keep_last = self.candidates.keep_last(),
            "selected versions matching the retention policy"
        );

        let mut plan = PrunePlan {
            total_versions: versions.len(),
            versions: base.clone(),
            base,
            added_children: Vec::new(),
            protected: Vec::new(),
        };

        if !self.mode.needs_manifests() {
            return Ok(plan);
        }

        let resolver = self.resolver.ok_or_else(|| {
            Error::invalid_config("multi-arch handling requires a manifest resolver")
        })?;
        let expander =
            MultiArchExpander::new(resolver).with_concurrency(self.resolve_concurrency);

        match self.mode {
            MultiArchMode::Ignore => {}
            MultiArchMode::DeleteChildren => {
                let children = expander.expand_for_deletion(&versions, &plan.base).await?;
                plan.versions.extend(children.iter().cloned());
                plan.added_children = children;
            }
            MultiArchMode::ProtectChildren => {
                let protected = expander.protected_digests(&versions).await?;
                plan.versions = MultiArchExpander::apply_protection(&plan.base, &protected);
                plan.protected = plan
                    .base
                    .iter()
                    .filter(|v| !plan.versions.contains(v.id))
                    .cloned()
                    .collect();
                tracing::info!(
                    protected = plan.protected.len(),
                    "excluded untagged versions referenced by tagged multi-arch images"
                );
            }
        }

        Ok(plan)
    }

    /// Deletes the versions of `plan` with `operation`.
    pub async fn execute(&self, plan: PrunePlan, operation: &dyn DeleteOperation) -> PruneReport {
        tracing::info!(
            count = plan.versions.len(),
            dry_run = operation.is_dry_run(),
            "pruning versions"
        );

        let outcome = self.executor.execute(operation, &plan.versions).await;
        PruneReport::new(plan.versions, outcome, operation.is_dry_run())
    }

    /// Plans and executes in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails; deletion failures are reported in
    /// the returned [`PruneReport`].
    pub async fn run(&self, operation: &dyn DeleteOperation) -> Result<PruneReport> {
        let plan = self.plan().await?;
        Ok(self.execute(plan, operation).await)
    }
}
