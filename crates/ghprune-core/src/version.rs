//! Container version records.
//!
//! A [`Version`] is a read-only snapshot of one stored image revision, as
//! returned by the registry's version listing. Versions are classified and
//! requested for deletion, never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a version within a container scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    /// Creates a version identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VersionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One stored image revision.
///
/// `name` is the content digest of the version's manifest (for example
/// `sha256:0f3c...`). It is the join key between the child entries of a
/// manifest list and the untagged versions that store them.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use ghprune_core::Version;
///
/// let version = Version::new(1, "sha256:abc", Utc::now()).with_tags(["latest"]);
/// assert!(version.is_tagged());
/// assert!(version.has_tag("latest"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Identifier, unique within the container.
    pub id: VersionId,

    /// Manifest digest.
    pub name: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Tags pointing at this version, in registry order.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Version {
    /// Creates an untagged version.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: VersionId::new(id),
            name: name.into(),
            created_at,
            tags: Vec::new(),
        }
    }

    /// Replaces the tags of this version.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if at least one tag points at this version.
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Returns true if `tag` points at this version.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns a compact JSON summary used in log lines.
    #[must_use]
    pub fn summary(&self) -> String {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "created_at": self.created_at.to_rfc3339(),
            "tags": self.tags,
        })
        .to_string()
    }
}
