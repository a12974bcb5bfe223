//! Prune command implementation.
//!
//! Lists the versions of a container, selects those the retention options
//! allow to prune, and deletes them (or only logs them on a dry run).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ghprune_core::{DryRun, Pruner, RetentionPolicy};
use ghprune_registry::{ManifestClient, PackagesClient, DEFAULT_API_URL, DEFAULT_REGISTRY_URL};
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::config::PruneConfig;
use crate::outputs::Outputs;
use crate::summary;

/// Arguments for the prune command.
///
/// List options accept repeated flags or one newline-separated value.
#[derive(Args, Debug, Default)]
pub struct PruneArgs {
    /// Token with `read:packages` and `delete:packages` scopes
    #[arg(long, env = "GHPRUNE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Workflow token used when `--token` is not given
    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// User owning the container
    #[arg(long, env = "GHPRUNE_USER")]
    pub user: Option<String>,

    /// Organization owning the container
    #[arg(long, env = "GHPRUNE_ORGANIZATION")]
    pub organization: Option<String>,

    /// Container (package) name
    #[arg(long, env = "GHPRUNE_CONTAINER")]
    pub container: String,

    /// Also prune the untagged platform images of pruned multi-platform tags
    #[arg(long, env = "GHPRUNE_REMOVE_MULTI_PLATFORM")]
    pub remove_multi_platform: bool,

    /// Only log what would be pruned
    #[arg(long, env = "GHPRUNE_DRY_RUN")]
    pub dry_run: bool,

    /// Number of most recent versions never pruned
    #[arg(long, env = "GHPRUNE_KEEP_LAST", allow_hyphen_values = true)]
    pub keep_last: Option<String>,

    /// Tags that keep their version
    #[arg(long, env = "GHPRUNE_KEEP_TAGS", value_delimiter = '\n')]
    pub keep_tags: Vec<String>,

    /// Patterns whose matching tags keep their version
    #[arg(long, env = "GHPRUNE_KEEP_TAGS_REGEXES", value_delimiter = '\n')]
    pub keep_tags_regexes: Vec<String>,

    /// Minimum age in days before a version may be pruned
    #[arg(long, env = "GHPRUNE_KEEP_YOUNGER_THAN", allow_hyphen_values = true)]
    pub keep_younger_than: Option<String>,

    /// Deprecated name of `--keep-younger-than`
    #[arg(long, env = "GHPRUNE_OLDER_THAN", hide = true, allow_hyphen_values = true)]
    pub older_than: Option<String>,

    /// Patterns whose matching tags prune their version
    #[arg(long, env = "GHPRUNE_PRUNE_TAGS_REGEXES", value_delimiter = '\n')]
    pub prune_tags_regexes: Vec<String>,

    /// Deprecated single-pattern form of `--prune-tags-regexes`
    #[arg(long, env = "GHPRUNE_TAG_REGEX", hide = true)]
    pub tag_regex: Option<String>,

    /// Prune versions without tags
    #[arg(long, env = "GHPRUNE_PRUNE_UNTAGGED")]
    pub prune_untagged: bool,

    /// Deprecated name of `--prune-untagged`
    #[arg(long, env = "GHPRUNE_UNTAGGED", hide = true)]
    pub untagged: bool,

    /// Maximum concurrent manifest requests
    #[arg(long, env = "GHPRUNE_RESOLVE_CONCURRENCY", default_value_t = ghprune_core::DEFAULT_RESOLVE_CONCURRENCY)]
    pub resolve_concurrency: usize,

    /// Maximum concurrent deletions
    #[arg(long, env = "GHPRUNE_DELETE_CONCURRENCY", default_value_t = ghprune_core::DEFAULT_DELETE_CONCURRENCY)]
    pub delete_concurrency: usize,

    /// GitHub REST API URL
    #[arg(long, env = "GHPRUNE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Container registry URL
    #[arg(long, env = "GHPRUNE_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    pub registry_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "GHPRUNE_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// File the Markdown summary is appended to
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    pub summary_file: Option<PathBuf>,

    /// File the step outputs are appended to
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,
}

/// Execute the prune command.
///
/// # Errors
///
/// Returns an error if:
/// - The arguments are invalid
/// - The versions or manifests cannot be fetched
/// - Some selected versions could not be pruned
pub async fn execute(args: PruneArgs) -> Result<()> {
    let config = PruneConfig::from_args(args)?;

    let run_id = Uuid::now_v7();
    let span = tracing::info_span!(
        "prune",
        %run_id,
        container = %config.container,
        dry_run = config.dry_run
    );
    run(&config).instrument(span).await
}

async fn run(config: &PruneConfig) -> Result<()> {
    info!(scope = %config.scope, mode = ?config.mode, "Pruning container versions");

    let packages = PackagesClient::new(&config.registry, config.scope.clone(), &config.container)
        .context("Failed to create packages client")?;

    let manifests = if config.mode.needs_manifests() {
        let owner = match config.scope.owner() {
            Some(owner) => owner.to_string(),
            None => packages
                .authenticated_login()
                .await
                .context("Failed to determine the authenticated user")?,
        };
        Some(
            ManifestClient::new(&config.registry, &owner, &config.container)
                .context("Failed to create manifest client")?,
        )
    } else {
        None
    };

    let mut pruner = Pruner::new(&packages, RetentionPolicy::new(config.options.clone()))
        .keep_last(config.keep_last)
        .resolve_concurrency(config.resolve_concurrency)
        .delete_concurrency(config.delete_concurrency);
    if let Some(ref manifests) = manifests {
        pruner = pruner.multi_arch(config.mode, manifests);
    }

    let plan = pruner
        .plan()
        .await
        .context("Failed to determine versions to prune")?;
    info!(count = plan.versions.len(), "Found versions to prune");

    let report = if config.dry_run {
        pruner.execute(plan, &DryRun).await
    } else {
        pruner.execute(plan, &packages).await
    };

    let markdown = summary::render(&config.container, &report);
    summary::write(config.summary_file.as_deref(), &markdown)
        .context("Failed to write summary")?;
    Outputs::from_report(&report)
        .write(config.output_file.as_deref())
        .context("Failed to write outputs")?;

    if !report.all_pruned() {
        anyhow::bail!(
            "Failed to prune some versions: {} out of {} versions were pruned",
            report.pruned.len(),
            report.intended.len()
        );
    }

    Ok(())
}
