//! Error types for pruning decisions.
//!
//! This module defines the error types used throughout the `ghprune-core` crate.
//! Failures raised by remote collaborators are boxed into the variant matching
//! the operation that failed, so callers can tell enumeration failures (fatal)
//! apart from per-version deletion failures (recoverable).

use thiserror::Error;

use crate::version::VersionId;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a collaborator implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while planning or executing a prune run.
#[derive(Error, Debug)]
pub enum Error {
    /// A tag pattern could not be compiled.
    #[error("Invalid tag pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The run configuration is inconsistent.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Listing the versions of the container failed.
    #[error("Failed to enumerate container versions: {source}")]
    Enumeration {
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
    },

    /// Fetching the manifest of a tag failed.
    #[error("Failed to resolve manifest for tag '{tag}': {source}")]
    ManifestResolution {
        /// Tag whose manifest was requested.
        tag: String,
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
    },

    /// Deleting a single version failed.
    #[error("Failed to delete version {id}: {source}")]
    Deletion {
        /// Identifier of the version.
        id: VersionId,
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Wraps a collaborator error raised while listing versions.
    pub fn enumeration(source: impl Into<BoxError>) -> Self {
        Self::Enumeration {
            source: source.into(),
        }
    }

    /// Wraps a collaborator error raised while resolving a tag's manifest.
    pub fn manifest_resolution(tag: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ManifestResolution {
            tag: tag.into(),
            source: source.into(),
        }
    }

    /// Wraps a collaborator error raised while deleting a version.
    pub fn deletion(id: VersionId, source: impl Into<BoxError>) -> Self {
        Self::Deletion {
            id,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_config() {
        let err = Error::invalid_config("user and organization are mutually exclusive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: user and organization are mutually exclusive"
        );
    }

    #[test]
    fn test_error_display_manifest_resolution() {
        let err = Error::manifest_resolution("v1.2.0", "connection reset");
        assert_eq!(
            err.to_string(),
            "Failed to resolve manifest for tag 'v1.2.0': connection reset"
        );
    }

    #[test]
    fn test_error_display_deletion() {
        let err = Error::deletion(VersionId::new(42), "403 Forbidden");
        assert_eq!(err.to_string(), "Failed to delete version 42: 403 Forbidden");
    }

    #[test]
    fn test_error_display_invalid_pattern() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = Error::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid tag pattern '(unclosed'"));
    }
}
