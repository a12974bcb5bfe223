//! Validated prune configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ghprune_core::{parse_keep_last, MultiArchMode, RetentionOptions};
use ghprune_registry::{RegistryConfig, Scope};

use crate::commands::prune::PruneArgs;

/// Everything a prune run needs, checked before any request is made.
#[derive(Debug)]
pub struct PruneConfig {
    /// Clients configuration, including the token.
    pub registry: RegistryConfig,

    /// Owner of the container.
    pub scope: Scope,

    /// Container name.
    pub container: String,

    /// Only log what would be pruned.
    pub dry_run: bool,

    /// Number of most recent versions never pruned.
    pub keep_last: usize,

    /// Retention options with compiled patterns.
    pub options: RetentionOptions,

    /// Multi-arch handling.
    pub mode: MultiArchMode,

    /// Maximum concurrent manifest requests.
    pub resolve_concurrency: usize,

    /// Maximum concurrent deletions.
    pub delete_concurrency: usize,

    /// File the Markdown summary is appended to.
    pub summary_file: Option<PathBuf>,

    /// File the step outputs are appended to.
    pub output_file: Option<PathBuf>,
}

impl PruneConfig {
    /// Validates the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or container is missing, both a user and
    /// an organization are given, `remove-multi-platform` is combined with
    /// `prune-untagged` or used without a named owner, or a pattern does not
    /// compile.
    pub fn from_args(args: PruneArgs) -> Result<Self> {
        let token = args
            .token
            .filter(|t| !t.trim().is_empty())
            .or(args.github_token)
            .filter(|t| !t.trim().is_empty())
            .context("A token is required (--token, GHPRUNE_TOKEN or GITHUB_TOKEN)")?;

        let container = args.container.trim().to_string();
        if container.is_empty() {
            anyhow::bail!("A container name is required");
        }

        let scope = Scope::from_selectors(args.user.as_deref(), args.organization.as_deref())
            .context("Inputs `organization` and `user` must not both be provided")?;

        let prune_untagged = args.prune_untagged || args.untagged;
        let mode = MultiArchMode::select(args.remove_multi_platform, prune_untagged)
            .context("Inputs `remove-multi-platform` and `prune-untagged` must not both be enabled")?;
        if mode == MultiArchMode::DeleteChildren && scope.owner().is_none() {
            anyhow::bail!("Input `remove-multi-platform` requires either `organization` or `user`");
        }

        let prune_tags_regexes = {
            let patterns = split_lines(args.prune_tags_regexes);
            if patterns.is_empty() {
                split_lines(args.tag_regex)
            } else {
                patterns
            }
        };

        let keep_younger_than = args
            .keep_younger_than
            .as_deref()
            .map(parse_days)
            .filter(|days| *days > 0)
            .or_else(|| args.older_than.as_deref().map(parse_days))
            .unwrap_or(0);

        let options = RetentionOptions::builder()
            .keep_tags(split_lines(args.keep_tags))
            .keep_tags_regexes(split_lines(args.keep_tags_regexes))
            .keep_younger_than(keep_younger_than)
            .prune_tags_regexes(prune_tags_regexes)
            .prune_untagged(prune_untagged)
            .build()
            .context("Invalid tag pattern")?;

        let registry = RegistryConfig::new(token)
            .with_api_url(args.api_url)
            .with_registry_url(args.registry_url)
            .with_timeout(Duration::from_secs(args.timeout));

        Ok(Self {
            registry,
            scope,
            container,
            dry_run: args.dry_run,
            keep_last: args.keep_last.as_deref().map_or(0, parse_keep_last),
            options,
            mode,
            resolve_concurrency: args.resolve_concurrency,
            delete_concurrency: args.delete_concurrency,
            summary_file: args.summary_file,
            output_file: args.output_file,
        })
    }
}

/// Parses a day count, treating negative or non-numeric input as 0.
fn parse_days(input: &str) -> u32 {
    input.trim().parse::<u32>().unwrap_or(0)
}

/// Flattens list values, splitting on newlines, trimming entries and
/// dropping blank ones.
fn split_lines<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
