//! Multi-architecture manifest handling.
//!
//! A multi-arch image is a tagged manifest list whose per-platform children are
//! stored as separate, untagged versions. Two operations keep those children
//! consistent with their parent:
//!
//! - [`MultiArchExpander::expand_for_deletion`] adds the children of pruned
//!   tags to the deletion set, since deleting the list alone leaves them
//!   orphaned in the registry.
//! - [`MultiArchExpander::protected_digests`] collects the children of every
//!   tagged version, so that pruning untagged versions never breaks a live
//!   multi-arch tag.
//!
//! Only untagged versions are ever added or removed here.

use std::collections::{BTreeSet, HashSet};

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::Result;
use crate::manifest::{Manifest, ManifestResolver};
use crate::pruning_list::PruningList;
use crate::version::Version;

/// Default number of manifests resolved concurrently.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

/// Resolves manifests of tagged versions and relates their children to the
/// untagged versions of the same container.
pub struct MultiArchExpander<'a> {
    resolver: &'a dyn ManifestResolver,
    concurrency: usize,
}

impl<'a> MultiArchExpander<'a> {
    /// Creates an expander backed by `resolver`.
    #[must_use]
    pub fn new(resolver: &'a dyn ManifestResolver) -> Self {
        Self {
            resolver,
            concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }

    /// Sets the number of manifests resolved concurrently (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the untagged children of the tagged versions in `pruning_list`
    /// that are not already part of it.
    ///
    /// Children are looked up by digest in `versions`, the full enumeration of
    /// the container; digests without a matching version are ignored. The
    /// result follows enumeration order and holds each version once.
    ///
    /// # Errors
    ///
    /// Returns an error if any manifest cannot be resolved.
    pub async fn expand_for_deletion(
        &self,
        versions: &[Version],
        pruning_list: &PruningList,
    ) -> Result<Vec<Version>> {
        let digests = self
            .child_digests(pruning_list.iter().filter(|v| v.is_tagged()))
            .await?;

        let mut seen = HashSet::new();
        let extra: Vec<Version> = versions
            .iter()
            .filter(|v| !v.is_tagged())
            .filter(|v| digests.contains(&v.name))
            .filter(|v| !pruning_list.contains(v.id))
            .filter(|v| seen.insert(v.id))
            .cloned()
            .collect();

        tracing::info!(
            children = extra.len(),
            "identified untagged children of pruned multi-arch tags"
        );

        Ok(extra)
    }

    /// Returns the digests referenced by the manifest list of any tagged
    /// version in `versions`.
    ///
    /// # Errors
    ///
    /// Returns an error if any manifest cannot be resolved.
    pub async fn protected_digests(&self, versions: &[Version]) -> Result<BTreeSet<String>> {
        let digests = self
            .child_digests(versions.iter().filter(|v| v.is_tagged()))
            .await?;

        tracing::info!(
            digests = digests.len(),
            "identified digests referenced by tagged multi-arch images"
        );

        Ok(digests)
    }

    /// Drops untagged versions whose digest is in `protected`.
    ///
    /// Tagged versions are never removed.
    #[must_use]
    pub fn apply_protection(pruning_list: &PruningList, protected: &BTreeSet<String>) -> PruningList {
        pruning_list.filtered(|v| v.is_tagged() || !protected.contains(&v.name))
    }

    async fn child_digests<'v, I>(&self, versions: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = &'v Version>,
    {
        // Every tag of a version points at the same manifest, so one per
        // version is enough.
        let tags: BTreeSet<&str> = versions
            .into_iter()
            .filter_map(|v| v.tags.first().map(String::as_str))
            .collect();

        let manifests: Vec<Option<Manifest>> = stream::iter(tags)
            .map(|tag| self.resolve(tag))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        Ok(manifests
            .iter()
            .flatten()
            .flat_map(|manifest| manifest.child_digests().map(str::to_owned))
            .collect())
    }

    async fn resolve(&self, tag: &str) -> Result<Option<Manifest>> {
        let manifest = self.resolver.resolve(tag).await?;

        match &manifest {
            Some(m) if m.is_multi_arch() => {
                tracing::debug!(
                    tag,
                    media_type = %m.media_type,
                    children = m.children.len(),
                    "resolved multi-arch manifest"
                );
            }
            Some(_) => tracing::debug!(tag, "tag is a single-platform image"),
            None => tracing::debug!(tag, "no manifest found for tag"),
        }

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::manifest::{ManifestChild, Platform, OCI_IMAGE_INDEX};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StaticResolver {
        manifests: HashMap<String, Manifest>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticResolver {
        fn with_index(mut self, tag: &str, children: &[&str]) -> Self {
            let children = children
                .iter()
                .map(|digest| ManifestChild {
                    platform: Some(Platform {
                        os: "linux".to_string(),
                        architecture: "amd64".to_string(),
                        variant: None,
                    }),
                    digest: (*digest).to_string(),
                })
                .collect();
            self.manifests
                .insert(tag.to_string(), Manifest::list(OCI_IMAGE_INDEX, children));
            self
        }

        fn with_single(mut self, tag: &str) -> Self {
            self.manifests.insert(
                tag.to_string(),
                Manifest::single("application/vnd.oci.image.manifest.v1+json"),
            );
            self
        }

        fn requests(&self) -> Vec<String> {
            let mut requests = self.requests.lock().unwrap().clone();
            requests.sort();
            requests
        }
    }

    #[async_trait]
    impl ManifestResolver for StaticResolver {
        async fn resolve(&self, tag: &str) -> Result<Option<Manifest>> {
            self.requests.lock().unwrap().push(tag.to_string());
            Ok(self.manifests.get(tag).cloned())
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl ManifestResolver for FailingResolver {
        async fn resolve(&self, tag: &str) -> Result<Option<Manifest>> {
            Err(Error::manifest_resolution(tag, "registry unavailable"))
        }
    }

    fn version(id: u64, digest: &str, tags: &[&str]) -> Version {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(id as i64);
        Version::new(id, digest, created).with_tags(tags.iter().copied())
    }

    fn ids(versions: &[Version]) -> Vec<u64> {
        versions.iter().map(|v| v.id.get()).collect()
    }

    #[tokio::test]
    async fn test_expand_adds_children_of_pruned_tag() {
        let versions = vec![
            version(1, "sha256:t", &["v1"]),
            version(2, "sha256:d1", &[]),
            version(3, "sha256:d2", &[]),
            version(4, "sha256:other", &[]),
        ];
        let resolver = StaticResolver::default().with_index("v1", &["sha256:d1", "sha256:d2"]);
        let list: PruningList = [versions[0].clone()].into_iter().collect();

        let extra = MultiArchExpander::new(&resolver)
            .expand_for_deletion(&versions, &list)
            .await
            .unwrap();

        assert_eq!(ids(&extra), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_expand_skips_children_already_in_list() {
        let versions = vec![
            version(1, "sha256:t", &["v1"]),
            version(2, "sha256:d1", &[]),
            version(3, "sha256:d2", &[]),
        ];
        let resolver = StaticResolver::default().with_index("v1", &["sha256:d1", "sha256:d2"]);
        let list: PruningList = [versions[0].clone(), versions[1].clone()].into_iter().collect();

        let extra = MultiArchExpander::new(&resolver)
            .expand_for_deletion(&versions, &list)
            .await
            .unwrap();

        assert_eq!(ids(&extra), vec![3]);
    }

    #[tokio::test]
    async fn test_expand_never_adds_tagged_children() {
        let versions = vec![
            version(1, "sha256:t", &["v1"]),
            version(2, "sha256:d1", &["arm-only"]),
            version(3, "sha256:d2", &[]),
        ];
        let resolver = StaticResolver::default().with_index("v1", &["sha256:d1", "sha256:d2"]);
        let list: PruningList = [versions[0].clone()].into_iter().collect();

        let extra = MultiArchExpander::new(&resolver)
            .expand_for_deletion(&versions, &list)
            .await
            .unwrap();

        assert_eq!(ids(&extra), vec![3]);
    }

    #[tokio::test]
    async fn test_expand_ignores_unknown_digests_and_missing_manifests() {
        let versions = vec![
            version(1, "sha256:t1", &["v1"]),
            version(2, "sha256:t2", &["v2"]),
            version(3, "sha256:unrelated", &[]),
        ];
        let resolver = StaticResolver::default().with_index("v1", &["sha256:gone"]);
        let list: PruningList = versions[..2].iter().cloned().collect();

        let extra = MultiArchExpander::new(&resolver)
            .expand_for_deletion(&versions, &list)
            .await
            .unwrap();

        assert!(extra.is_empty());
    }

    #[tokio::test]
    async fn test_expand_shared_child_added_once() {
        let versions = vec![
            version(1, "sha256:t1", &["v1"]),
            version(2, "sha256:t2", &["v2"]),
            version(3, "sha256:shared", &[]),
        ];
        let resolver = StaticResolver::default()
            .with_index("v1", &["sha256:shared"])
            .with_index("v2", &["sha256:shared"]);
        let list: PruningList = versions[..2].iter().cloned().collect();

        let extra = MultiArchExpander::new(&resolver)
            .expand_for_deletion(&versions, &list)
            .await
            .unwrap();

        assert_eq!(ids(&extra), vec![3]);
    }

    #[tokio::test]
    async fn test_resolves_one_tag_per_version() {
        let versions = vec![
            version(1, "sha256:t1", &["v1", "latest"]),
            version(2, "sha256:t2", &["v2"]),
            version(3, "sha256:u", &[]),
        ];
        let resolver = StaticResolver::default();

        MultiArchExpander::new(&resolver)
            .with_concurrency(2)
            .protected_digests(&versions)
            .await
            .unwrap();

        assert_eq!(resolver.requests(), vec!["v1".to_string(), "v2".to_string()]);
    }

    #[tokio::test]
    async fn test_protected_digests_collects_children_of_all_tags() {
        let versions = vec![
            version(1, "sha256:kept", &["latest"]),
            version(2, "sha256:single", &["v0"]),
            version(3, "sha256:d3", &[]),
        ];
        let resolver = StaticResolver::default()
            .with_index("latest", &["sha256:d3", "sha256:d4"])
            .with_single("v0");

        let protected = MultiArchExpander::new(&resolver)
            .protected_digests(&versions)
            .await
            .unwrap();

        assert_eq!(
            protected.into_iter().collect::<Vec<_>>(),
            vec!["sha256:d3".to_string(), "sha256:d4".to_string()]
        );
    }

    #[tokio::test]
    async fn test_protection_excludes_referenced_untagged() {
        let versions = vec![
            version(1, "sha256:kept", &["latest"]),
            version(2, "sha256:d3", &[]),
            version(3, "sha256:orphan", &[]),
        ];
        let resolver = StaticResolver::default().with_index("latest", &["sha256:d3"]);
        let base: PruningList = versions[1..].iter().cloned().collect();

        let protected = MultiArchExpander::new(&resolver)
            .protected_digests(&versions)
            .await
            .unwrap();
        let list = MultiArchExpander::apply_protection(&base, &protected);

        assert_eq!(ids(list.as_slice()), vec![3]);
    }

    #[test]
    fn test_protection_never_removes_tagged() {
        let tagged = version(1, "sha256:d1", &["pr-1"]);
        let base: PruningList = [tagged].into_iter().collect();
        let protected: BTreeSet<String> = ["sha256:d1".to_string()].into_iter().collect();

        let list = MultiArchExpander::apply_protection(&base, &protected);
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_propagates() {
        let versions = vec![version(1, "sha256:t", &["v1"])];
        let result = MultiArchExpander::new(&FailingResolver)
            .protected_digests(&versions)
            .await;

        assert!(matches!(result, Err(Error::ManifestResolution { tag, .. }) if tag == "v1"));
    }
}
