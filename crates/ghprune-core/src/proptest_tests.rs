//! Property-based tests for the pruning engine.
//!
//! These tests use proptest to verify the retention and multi-arch invariants
//! across many randomly generated enumerations.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::executor::block_on;
use proptest::prelude::*;

use crate::{
    CandidateListBuilder, DryRun, Manifest, ManifestChild, ManifestResolver, MultiArchExpander,
    PruneExecutor, PruningList, Result, RetentionOptions, RetentionPolicy, Version,
    OCI_IMAGE_INDEX,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Strategy for generating tag names.
fn tag_strategy() -> impl Strategy<Value = String> {
    "(latest|main|v[0-9]\\.[0-9]|pr-[0-9]{1,3}|sha-[a-f0-9]{7})"
}

/// Strategy for generating tag lists, frequently empty.
fn tags_strategy() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        Just(Vec::new()),
        prop::collection::vec(tag_strategy(), 1..4),
    ]
}

/// Strategy for generating enumerations with unique ids and digests.
fn versions_strategy() -> impl Strategy<Value = Vec<Version>> {
    prop::collection::vec((0i64..60 * 24 * 90, tags_strategy()), 0..25).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (age_minutes, tags))| {
                Version::new(
                    i as u64 + 1,
                    format!("sha256:{i:04}"),
                    now() - Duration::minutes(age_minutes),
                )
                .with_tags(tags)
            })
            .collect()
    })
}

/// Strategy for generating retention options.
fn options_strategy() -> impl Strategy<Value = RetentionOptions> {
    (
        prop::collection::vec(tag_strategy(), 0..3),
        prop::sample::subsequence(vec!["^v", "^main$", "latest"], 0..2),
        0u32..60,
        prop::sample::subsequence(vec!["^pr-", "^sha-", ".*"], 0..2),
        any::<bool>(),
    )
        .prop_map(|(keep, keep_re, younger, prune_re, untagged)| {
            RetentionOptions::builder()
                .keep_tags(keep)
                .keep_tags_regexes(keep_re)
                .keep_younger_than(younger)
                .prune_tags_regexes(prune_re)
                .prune_untagged(untagged)
                .build()
                .unwrap()
        })
}

/// Resolver mapping each tag to an index over arbitrary digests.
struct MapResolver(HashMap<String, Vec<String>>);

#[async_trait]
impl ManifestResolver for MapResolver {
    async fn resolve(&self, tag: &str) -> Result<Option<Manifest>> {
        Ok(self.0.get(tag).map(|digests| {
            Manifest::list(
                OCI_IMAGE_INDEX,
                digests
                    .iter()
                    .map(|digest| ManifestChild {
                        platform: None,
                        digest: digest.clone(),
                    })
                    .collect(),
            )
        }))
    }
}

/// Links every tag to a pseudo-random subset of the enumeration's digests.
fn resolver_for(versions: &[Version], seed: usize) -> MapResolver {
    let digests: Vec<&String> = versions.iter().map(|v| &v.name).collect();
    let mut map = HashMap::new();
    for (i, version) in versions.iter().enumerate() {
        for tag in &version.tags {
            let children = digests
                .iter()
                .enumerate()
                .filter(|(j, _)| (i + j + seed) % 3 == 0)
                .map(|(_, d)| (*d).clone())
                .chain(std::iter::once(format!("sha256:missing-{i}")))
                .collect();
            map.insert(tag.clone(), children);
        }
    }
    MapResolver(map)
}

proptest! {
    /// Versions younger than the threshold are always kept.
    #[test]
    fn young_versions_are_kept(
        options in options_strategy(),
        tags in tags_strategy(),
        threshold in 1u32..60,
        minutes in 0i64..60 * 24 * 60,
    ) {
        let mut options = options;
        options.keep_younger_than = threshold;
        let minutes = minutes % (i64::from(threshold) * 60 * 24);

        let version = Version::new(1, "sha256:x", now() - Duration::minutes(minutes)).with_tags(tags);
        let policy = RetentionPolicy::at(options, now());
        prop_assert!(!policy.should_prune(&version));
    }

    /// Untagged versions old enough are pruned when pruning untagged.
    #[test]
    fn old_untagged_versions_are_pruned(options in options_strategy(), extra_days in 0i64..30) {
        let mut options = options;
        options.prune_untagged = true;
        let age = i64::from(options.keep_younger_than) + extra_days;

        let version = Version::new(1, "sha256:x", now() - Duration::days(age));
        let policy = RetentionPolicy::at(options, now());
        prop_assert!(policy.should_prune(&version));
    }

    /// Keep tags win over prune patterns.
    #[test]
    fn keep_tags_beat_prune_patterns(mut tags in prop::collection::vec(tag_strategy(), 0..3)) {
        tags.push("release".to_string());
        let options = RetentionOptions::builder()
            .keep_tags(["release"])
            .keep_tags_regexes(["^never-matches$"])
            .prune_tags_regexes([".*"])
            .build()
            .unwrap();

        let version = Version::new(1, "sha256:x", now() - Duration::days(400)).with_tags(tags);
        prop_assert!(!RetentionPolicy::at(options, now()).should_prune(&version));
    }

    /// The most recent `keep_last` versions are never candidates, and raising
    /// `keep_last` never adds candidates.
    #[test]
    fn keep_last_exempts_most_recent(
        versions in versions_strategy(),
        options in options_strategy(),
        keep_last in 0usize..30,
    ) {
        let policy = RetentionPolicy::at(options, now());
        let list = CandidateListBuilder::new(keep_last).build(&versions, |v| policy.should_prune(v));

        let mut ordered = versions.clone();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for exempt in ordered.iter().take(keep_last) {
            prop_assert!(!list.contains(exempt.id));
        }

        let wider = CandidateListBuilder::new(keep_last + 1).build(&versions, |v| policy.should_prune(v));
        prop_assert!(wider.len() <= list.len());
    }

    /// Expansion output is disjoint from its input and made of untagged
    /// children of the input's tags.
    #[test]
    fn expansion_is_disjoint_and_linked(
        versions in versions_strategy(),
        pick in prop::collection::vec(any::<bool>(), 25),
        seed in 0usize..3,
    ) {
        let resolver = resolver_for(&versions, seed);
        let list: PruningList = versions
            .iter()
            .zip(pick.iter())
            .filter(|(_, picked)| **picked)
            .map(|(v, _)| v.clone())
            .collect();

        let extra = block_on(MultiArchExpander::new(&resolver).expand_for_deletion(&versions, &list)).unwrap();

        let linked: BTreeSet<String> = list
            .iter()
            .filter_map(|v| v.tags.first())
            .filter_map(|tag| resolver.0.get(tag))
            .flatten()
            .cloned()
            .collect();

        let mut seen = BTreeSet::new();
        for version in &extra {
            prop_assert!(!list.contains(version.id));
            prop_assert!(!version.is_tagged());
            prop_assert!(linked.contains(&version.name));
            prop_assert!(seen.insert(version.id));
        }
    }

    /// Protected digests are deterministic for a given enumeration.
    #[test]
    fn protected_digests_are_deterministic(versions in versions_strategy(), seed in 0usize..3) {
        let resolver = resolver_for(&versions, seed);
        let expander = MultiArchExpander::new(&resolver).with_concurrency(3);

        let first = block_on(expander.protected_digests(&versions)).unwrap();
        let second = block_on(expander.protected_digests(&versions)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Dry runs prune every version they are given.
    #[test]
    fn dry_run_prunes_whole_list(versions in versions_strategy()) {
        let outcome = block_on(PruneExecutor::default().execute(&DryRun, &versions));
        prop_assert_eq!(outcome.pruned.len(), versions.len());
        prop_assert!(outcome.failed.is_empty());
    }
}
