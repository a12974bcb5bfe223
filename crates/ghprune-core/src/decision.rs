//! Keep/prune decision types.
//!
//! This module defines the [`Decision`] produced by evaluating a
//! [`RetentionPolicy`](crate::RetentionPolicy) against one version, along with
//! the rule that decided it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The rule that decided the fate of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The version is younger than the configured minimum age.
    TooYoung,

    /// The version carries no tags and untagged versions are pruned.
    Untagged,

    /// One of the version's tags is listed as a keep tag.
    KeepTag,

    /// One of the version's tags matches a keep pattern.
    KeepTagRegex,

    /// One of the version's tags matches a prune pattern.
    PruneTagRegex,

    /// No rule matched; the version is kept.
    NoMatch,
}

impl DecisionReason {
    /// Returns true if this rule selects the version for pruning.
    #[must_use]
    pub const fn prunes(self) -> bool {
        matches!(self, Self::Untagged | Self::PruneTagRegex)
    }

    /// Returns a human-readable description of the rule.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::TooYoung => "younger than the minimum age",
            Self::Untagged => "untagged",
            Self::KeepTag => "has a keep tag",
            Self::KeepTagRegex => "matches a keep pattern",
            Self::PruneTagRegex => "matches a prune pattern",
            Self::NoMatch => "did not match any rule",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// The result of evaluating a retention policy against one version.
///
/// # Examples
///
/// ```rust
/// use ghprune_core::{Decision, DecisionReason};
///
/// let decision = Decision::new(DecisionReason::PruneTagRegex, 30);
/// assert!(decision.is_prune());
///
/// let kept = Decision::new(DecisionReason::KeepTag, 30);
/// assert!(!kept.is_prune());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Rule that decided.
    pub reason: DecisionReason,

    /// Age of the version in whole days at evaluation time.
    pub age_days: i64,
}

impl Decision {
    /// Creates a decision.
    #[must_use]
    pub const fn new(reason: DecisionReason, age_days: i64) -> Self {
        Self { reason, age_days }
    }

    /// Returns true if the version should be pruned.
    #[must_use]
    pub const fn is_prune(&self) -> bool {
        self.reason.prunes()
    }
}
