//! Ordered, id-unique list of versions selected for pruning.

use std::collections::HashSet;

use serde::Serialize;

use crate::version::{Version, VersionId};

/// An ordered sequence of versions, duplicate-free by id.
///
/// Pushing a version whose id is already present is a no-op, so merging the
/// base candidates with multi-arch children never yields double deletions.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use ghprune_core::{PruningList, Version};
///
/// let mut list = PruningList::new();
/// assert!(list.push(Version::new(1, "sha256:a", Utc::now())));
/// assert!(!list.push(Version::new(1, "sha256:a", Utc::now())));
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PruningList {
    versions: Vec<Version>,
    #[serde(skip)]
    ids: HashSet<VersionId>,
}

impl PruningList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `version` unless its id is already present.
    ///
    /// Returns true if the version was added.
    pub fn push(&mut self, version: Version) -> bool {
        if self.ids.insert(version.id) {
            self.versions.push(version);
            true
        } else {
            false
        }
    }

    /// Returns true if a version with `id` is present.
    #[must_use]
    pub fn contains(&self, id: VersionId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterates over the versions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.versions.iter()
    }

    /// Returns the versions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Version] {
        &self.versions
    }

    /// Returns the ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<VersionId> {
        self.versions.iter().map(|v| v.id).collect()
    }

    /// Returns a new list holding only the versions accepted by `keep`.
    #[must_use]
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Version) -> bool,
    {
        self.iter().filter(|v| keep(v)).cloned().collect()
    }

    /// Consumes the list and returns the versions.
    #[must_use]
    pub fn into_vec(self) -> Vec<Version> {
        self.versions
    }
}

impl Extend<Version> for PruningList {
    fn extend<T: IntoIterator<Item = Version>>(&mut self, iter: T) {
        for version in iter {
            self.push(version);
        }
    }
}

impl FromIterator<Version> for PruningList {
    fn from_iter<T: IntoIterator<Item = Version>>(iter: T) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl IntoIterator for PruningList {
    type Item = Version;
    type IntoIter = std::vec::IntoIter<Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.into_iter()
    }
}

impl<'a> IntoIterator for &'a PruningList {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}
