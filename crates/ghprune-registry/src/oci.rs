//! Registry manifest wire types.
//!
//! Only the fields needed to relate a manifest list to its per-platform
//! children are decoded; everything else in the document is ignored.

use ghprune_core::{Manifest, ManifestChild, Platform};
use serde::{Deserialize, Serialize};

/// Manifest media types understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType;

impl MediaType {
    /// Docker manifest list media type.
    pub const DOCKER_MANIFEST_LIST: &'static str = ghprune_core::DOCKER_MANIFEST_LIST;

    /// Docker image manifest media type.
    pub const DOCKER_MANIFEST: &'static str =
        "application/vnd.docker.distribution.manifest.v2+json";

    /// OCI image index media type.
    pub const OCI_INDEX: &'static str = ghprune_core::OCI_IMAGE_INDEX;

    /// OCI image manifest media type.
    pub const OCI_MANIFEST: &'static str = "application/vnd.oci.image.manifest.v1+json";

    /// Value of the `Accept` header sent with manifest requests.
    ///
    /// List types come first so registries serve the index rather than
    /// picking a platform.
    #[must_use]
    pub fn accept_header() -> String {
        [
            Self::DOCKER_MANIFEST_LIST,
            Self::OCI_INDEX,
            Self::DOCKER_MANIFEST,
            Self::OCI_MANIFEST,
        ]
        .join(", ")
    }
}

/// A manifest document as served by the registry.
///
/// Single-platform manifests decode too; they simply have no `manifests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    /// Schema version (always 2 in practice).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    /// Media type declared in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Per-platform entries.
    #[serde(default)]
    pub manifests: Vec<IndexEntry>,
}

/// One entry of an image index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Media type of the referenced manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Digest of the referenced manifest.
    pub digest: String,

    /// Size in bytes of the referenced manifest.
    #[serde(default)]
    pub size: u64,

    /// Target platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl ImageIndex {
    /// Converts the document into the engine's manifest model.
    ///
    /// The media type declared in the body wins over `content_type`, which is
    /// only used when the body has none.
    #[must_use]
    pub fn into_manifest(self, content_type: Option<&str>) -> Manifest {
        let media_type = self
            .media_type
            .or_else(|| content_type.map(media_type_essence))
            .unwrap_or_default();

        if !ghprune_core::is_manifest_list(&media_type) {
            return Manifest::single(media_type);
        }

        let children = self
            .manifests
            .into_iter()
            .map(|entry| ManifestChild {
                platform: entry.platform,
                digest: entry.digest,
            })
            .collect();
        Manifest::list(media_type, children)
    }
}

/// Strips parameters such as `; charset=utf-8` from a content type.
fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": [
            {
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": "sha256:amd64",
                "size": 1024,
                "platform": {"architecture": "amd64", "os": "linux"}
            },
            {
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": "sha256:arm64",
                "size": 1024,
                "platform": {"architecture": "arm64", "os": "linux", "variant": "v8"}
            }
        ]
    }"#;

    #[test]
    fn test_accept_header_lists_index_types_first() {
        let accept = MediaType::accept_header();
        assert!(accept.starts_with(MediaType::DOCKER_MANIFEST_LIST));
        assert!(accept.contains(MediaType::OCI_INDEX));
        assert!(accept.contains(MediaType::OCI_MANIFEST));
    }

    #[test]
    fn test_parse_oci_index() {
        let index: ImageIndex = serde_json::from_str(INDEX).unwrap();
        let manifest = index.into_manifest(None);

        assert!(manifest.is_multi_arch());
        assert_eq!(
            manifest.child_digests().collect::<Vec<_>>(),
            vec!["sha256:amd64", "sha256:arm64"]
        );
        let platform = manifest.children[1].platform.as_ref().unwrap();
        assert_eq!(platform.to_string(), "linux/arm64/v8");
    }

    #[test]
    fn test_content_type_fallback() {
        let json = r#"{"schemaVersion": 2, "manifests": [{"digest": "sha256:a"}]}"#;
        let index: ImageIndex = serde_json::from_str(json).unwrap();
        let manifest = index.into_manifest(Some(
            "application/vnd.docker.distribution.manifest.list.v2+json; charset=utf-8",
        ));

        assert_eq!(manifest.media_type, MediaType::DOCKER_MANIFEST_LIST);
        assert_eq!(manifest.child_digests().collect::<Vec<_>>(), vec!["sha256:a"]);
    }

    #[test]
    fn test_single_manifest_has_no_children() {
        let json = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "config": {"digest": "sha256:cfg", "size": 10},
            "layers": []
        }"#;
        let index: ImageIndex = serde_json::from_str(json).unwrap();
        let manifest = index.into_manifest(None);

        assert!(!manifest.is_multi_arch());
        assert!(manifest.children.is_empty());
    }
}
