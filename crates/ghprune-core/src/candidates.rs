//! Base prune list construction.

use crate::pruning_list::PruningList;
use crate::version::Version;

/// Parses a keep-last count leniently.
///
/// Negative, fractional and non-numeric input yields zero.
///
/// # Examples
///
/// ```rust
/// use ghprune_core::parse_keep_last;
///
/// assert_eq!(parse_keep_last("5"), 5);
/// assert_eq!(parse_keep_last(" 3 "), 3);
/// assert_eq!(parse_keep_last("-2"), 0);
/// assert_eq!(parse_keep_last("three"), 0);
/// assert_eq!(parse_keep_last(""), 0);
/// ```
#[must_use]
pub fn parse_keep_last(input: &str) -> usize {
    input.trim().parse::<usize>().unwrap_or(0)
}

/// Builds the base prune list from a full version enumeration.
///
/// Versions are ordered most recent first; the first `keep_last` are retained
/// unconditionally and never reach the predicate. The remaining versions are
/// kept in that order when the predicate selects them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateListBuilder {
    keep_last: usize,
}

impl CandidateListBuilder {
    /// Creates a builder that exempts the `keep_last` most recent versions.
    #[must_use]
    pub const fn new(keep_last: usize) -> Self {
        Self { keep_last }
    }

    /// Returns the number of exempted versions.
    #[must_use]
    pub const fn keep_last(&self) -> usize {
        self.keep_last
    }

    /// Selects the versions to prune.
    pub fn build<F>(&self, versions: &[Version], mut should_prune: F) -> PruningList
    where
        F: FnMut(&Version) -> bool,
    {
        let mut ordered: Vec<&Version> = versions.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let exempt = self.keep_last.min(ordered.len());
        if exempt > 0 {
            tracing::debug!(
                keep_last = self.keep_last,
                exempt,
                "retaining most recent versions"
            );
        }

        ordered
            .into_iter()
            .skip(exempt)
            .filter(|v| should_prune(v))
            .cloned()
            .collect()
    }
}
