//! Resolved manifests and the resolver contract.
//!
//! The engine only needs to know whether a tag points at a manifest list (a
//! Docker manifest list or an OCI image index) and, if so, which per-platform
//! digests it references. Fetching and decoding the manifest is left to a
//! [`ManifestResolver`] implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Docker manifest list media type.
pub const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// OCI image index media type.
pub const OCI_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Returns true if `media_type` denotes a multi-platform manifest.
#[must_use]
pub fn is_manifest_list(media_type: &str) -> bool {
    media_type == DOCKER_MANIFEST_LIST || media_type == OCI_IMAGE_INDEX
}

/// Target platform of a manifest list entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system (e.g. `linux`).
    pub os: String,

    /// CPU architecture (e.g. `arm64`).
    pub architecture: String,

    /// CPU variant (e.g. `v8`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}

/// One per-platform entry of a manifest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestChild {
    /// Platform the child targets, when the registry reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Digest of the child manifest.
    pub digest: String,
}

/// A manifest as far as pruning is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Media type reported by the registry.
    pub media_type: String,

    /// Per-platform children; empty for a single-platform manifest.
    #[serde(default)]
    pub children: Vec<ManifestChild>,
}

impl Manifest {
    /// Creates a single-platform manifest.
    #[must_use]
    pub fn single(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            children: Vec::new(),
        }
    }

    /// Creates a manifest list with the given children.
    #[must_use]
    pub fn list(media_type: impl Into<String>, children: Vec<ManifestChild>) -> Self {
        Self {
            media_type: media_type.into(),
            children,
        }
    }

    /// Returns true if this manifest is a manifest list or image index.
    #[must_use]
    pub fn is_multi_arch(&self) -> bool {
        is_manifest_list(&self.media_type)
    }

    /// Returns the child digests, or nothing when this is not a manifest list.
    pub fn child_digests(&self) -> impl Iterator<Item = &str> {
        let children: &[ManifestChild] = if self.is_multi_arch() {
            self.children.as_slice()
        } else {
            &[]
        };
        children.iter().map(|child| child.digest.as_str())
    }
}

/// Source of manifests for the tags of one container.
///
/// Implementations return `Ok(None)` when the tag has no manifest the registry
/// can serve; the engine treats that as a manifest without children. Errors
/// abort the run, since an incomplete view of the manifests could protect too
/// little or delete too much.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Resolves the manifest `tag` points at.
    async fn resolve(&self, tag: &str) -> Result<Option<Manifest>>;
}
