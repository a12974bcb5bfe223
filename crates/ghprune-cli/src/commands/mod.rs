//! CLI commands and argument parsing.

pub mod prune;

use clap::{Parser, Subcommand};

/// ghprune - Retention-based pruning of container versions
#[derive(Parser)]
#[command(name = "ghprune")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Prune versions of a container
    Prune(Box<prune::PruneArgs>),

    /// Print version information
    Version,
}
