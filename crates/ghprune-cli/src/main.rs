//! ghprune - prunes container image versions from GitHub Packages.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod outputs;
mod summary;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghprune=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prune(args) => commands::prune::execute(*args).await,
        Commands::Version => {
            println!("ghprune {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
