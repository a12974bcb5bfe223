//! # ghprune Core
//!
//! Decision engine for pruning container image versions from a registry.
//!
//! This crate holds everything that does not talk to a remote service:
//!
//! - [`RetentionPolicy`] - per-version keep/prune predicate
//! - [`CandidateListBuilder`] - ordered candidate list honoring keep-last
//! - [`MultiArchExpander`] - multi-platform child expansion and protection
//! - [`PruneExecutor`] - best-effort batch deletion
//! - [`Pruner`] - orchestration of a complete run
//!
//! The remote sides are reached through the [`VersionSource`],
//! [`ManifestResolver`] and [`DeleteOperation`] traits.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use ghprune_core::{CandidateListBuilder, RetentionOptions, RetentionPolicy, Version};
//!
//! let options = RetentionOptions::builder()
//!     .keep_younger_than(7)
//!     .prune_untagged(true)
//!     .build()
//!     .unwrap();
//! let policy = RetentionPolicy::new(options);
//!
//! let versions = vec![
//!     Version::new(1, "sha256:aaa", Utc::now() - Duration::days(30)),
//!     Version::new(2, "sha256:bbb", Utc::now() - Duration::days(1)),
//! ];
//!
//! let list = CandidateListBuilder::new(0).build(&versions, |v| policy.should_prune(v));
//! assert_eq!(list.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod candidates;
pub mod decision;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod multiarch;
pub mod policy;
pub mod pruner;
pub mod pruning_list;
pub mod report;
pub mod version;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use candidates::{parse_keep_last, CandidateListBuilder};
pub use decision::{Decision, DecisionReason};
pub use error::{BoxError, Error, Result};
pub use executor::{
    DeleteOperation, DryRun, FailedDeletion, PruneExecutor, PruneOutcome,
    DEFAULT_DELETE_CONCURRENCY,
};
pub use manifest::{
    is_manifest_list, Manifest, ManifestChild, ManifestResolver, Platform, DOCKER_MANIFEST_LIST,
    OCI_IMAGE_INDEX,
};
pub use multiarch::{MultiArchExpander, DEFAULT_RESOLVE_CONCURRENCY};
pub use policy::{RetentionOptions, RetentionOptionsBuilder, RetentionPolicy};
pub use pruner::{MultiArchMode, PrunePlan, Pruner, VersionSource};
pub use pruning_list::PruningList;
pub use report::PruneReport;
pub use version::{Version, VersionId};
