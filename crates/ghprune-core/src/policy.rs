//! Retention policy and the keep/prune predicate.
//!
//! A [`RetentionPolicy`] pairs [`RetentionOptions`] with a fixed evaluation
//! instant and decides, for one [`Version`] at a time, whether it is kept or
//! pruned. Rules are evaluated in order and the first match wins:
//!
//! 1. younger than `keep_younger_than` days → keep
//! 2. untagged while `prune_untagged` is set → prune
//! 3. any tag listed in `keep_tags` → keep
//! 4. any tag matching `keep_tags_regexes` → keep
//! 5. any tag matching `prune_tags_regexes` → prune
//! 6. otherwise → keep

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::decision::{Decision, DecisionReason};
use crate::error::{Error, Result};
use crate::version::Version;

const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Returns the whole days elapsed between `created_at` and `now`.
///
/// The millisecond difference is floor-divided by the day length, so a version
/// created in the future has a negative age.
///
/// # Examples
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use ghprune_core::policy::age_in_days;
///
/// let now = Utc::now();
/// assert_eq!(age_in_days(now - Duration::hours(47), now), 1);
/// assert_eq!(age_in_days(now + Duration::hours(1), now), -1);
/// ```
#[must_use]
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// Options controlling which versions are retained.
///
/// Patterns are compiled once by [`RetentionOptionsBuilder::build`] and reused
/// for every evaluation. A tag matches a pattern if the pattern matches
/// anywhere in the tag; anchor it with `^…$` for a full match.
#[derive(Debug, Clone, Default)]
pub struct RetentionOptions {
    /// Tags that always keep the version they point at.
    pub keep_tags: BTreeSet<String>,

    /// Patterns whose match keeps the version.
    pub keep_tags_regexes: Vec<Regex>,

    /// Minimum age in days before a version may be pruned.
    pub keep_younger_than: u32,

    /// Patterns whose match prunes the version.
    pub prune_tags_regexes: Vec<Regex>,

    /// Prune versions without any tag.
    pub prune_untagged: bool,
}

impl RetentionOptions {
    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> RetentionOptionsBuilder {
        RetentionOptionsBuilder::default()
    }

    fn matches_any(patterns: &[Regex], tags: &[String]) -> bool {
        patterns
            .iter()
            .any(|pattern| tags.iter().any(|tag| pattern.is_match(tag)))
    }
}

/// Builder for [`RetentionOptions`].
///
/// # Examples
///
/// ```rust
/// use ghprune_core::RetentionOptions;
///
/// let options = RetentionOptions::builder()
///     .keep_tags(["latest"])
///     .prune_tags_regexes(["^pr-"])
///     .keep_younger_than(7)
///     .prune_untagged(true)
///     .build()?;
///
/// assert!(options.keep_tags.contains("latest"));
/// # Ok::<(), ghprune_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct RetentionOptionsBuilder {
    keep_tags: BTreeSet<String>,
    keep_tags_regexes: Vec<String>,
    keep_younger_than: u32,
    prune_tags_regexes: Vec<String>,
    prune_untagged: bool,
}

impl RetentionOptionsBuilder {
    /// Adds tags that always keep their version.
    #[must_use]
    pub fn keep_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds patterns whose match keeps the version.
    #[must_use]
    pub fn keep_tags_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_tags_regexes
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the minimum age in days.
    #[must_use]
    pub const fn keep_younger_than(mut self, days: u32) -> Self {
        self.keep_younger_than = days;
        self
    }

    /// Adds patterns whose match prunes the version.
    #[must_use]
    pub fn prune_tags_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prune_tags_regexes
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enables or disables pruning of untagged versions.
    #[must_use]
    pub const fn prune_untagged(mut self, enabled: bool) -> Self {
        self.prune_untagged = enabled;
        self
    }

    /// Compiles the patterns and builds the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if any pattern fails to compile.
    pub fn build(self) -> Result<RetentionOptions> {
        Ok(RetentionOptions {
            keep_tags: self.keep_tags,
            keep_tags_regexes: compile_all(&self.keep_tags_regexes)?,
            keep_younger_than: self.keep_younger_than,
            prune_tags_regexes: compile_all(&self.prune_tags_regexes)?,
            prune_untagged: self.prune_untagged,
        })
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Retention options bound to an evaluation instant.
///
/// The instant is fixed when the policy is created so every version of a run
/// is judged against the same clock.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    options: RetentionOptions,
    now: DateTime<Utc>,
}

impl RetentionPolicy {
    /// Creates a policy evaluated at the current time.
    #[must_use]
    pub fn new(options: RetentionOptions) -> Self {
        Self::at(options, Utc::now())
    }

    /// Creates a policy evaluated at `now`.
    #[must_use]
    pub const fn at(options: RetentionOptions, now: DateTime<Utc>) -> Self {
        Self { options, now }
    }

    /// Returns the options of this policy.
    #[must_use]
    pub const fn options(&self) -> &RetentionOptions {
        &self.options
    }

    /// Returns the evaluation instant.
    #[must_use]
    pub const fn evaluated_at(&self) -> DateTime<Utc> {
        self.now
    }

    /// Decides whether `version` is kept or pruned.
    #[must_use]
    pub fn decide(&self, version: &Version) -> Decision {
        let age = age_in_days(version.created_at, self.now);
        let decision = Decision::new(self.first_matching_rule(version, age), age);

        tracing::debug!(
            version_id = %version.id,
            name = %version.name,
            tags = ?version.tags,
            age,
            reason = %decision.reason,
            prune = decision.is_prune(),
            "evaluated version"
        );

        decision
    }

    /// Returns true if `version` should be pruned.
    #[must_use]
    pub fn should_prune(&self, version: &Version) -> bool {
        self.decide(version).is_prune()
    }

    fn first_matching_rule(&self, version: &Version, age: i64) -> DecisionReason {
        let options = &self.options;

        if i64::from(options.keep_younger_than) > age {
            return DecisionReason::TooYoung;
        }

        let tags = &version.tags;

        if tags.is_empty() {
            return if options.prune_untagged {
                DecisionReason::Untagged
            } else {
                DecisionReason::NoMatch
            };
        }

        if tags.iter().any(|tag| options.keep_tags.contains(tag)) {
            return DecisionReason::KeepTag;
        }

        if RetentionOptions::matches_any(&options.keep_tags_regexes, tags) {
            return DecisionReason::KeepTagRegex;
        }

        if RetentionOptions::matches_any(&options.prune_tags_regexes, tags) {
            return DecisionReason::PruneTagRegex;
        }

        DecisionReason::NoMatch
    }
}
