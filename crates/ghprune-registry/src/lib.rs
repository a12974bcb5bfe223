//! # ghprune Registry
//!
//! Remote collaborators of the pruning engine for GitHub Packages.
//!
//! - [`PackagesClient`] lists and deletes the versions of a container through
//!   the GitHub REST API. It implements [`ghprune_core::VersionSource`] and
//!   [`ghprune_core::DeleteOperation`].
//! - [`ManifestClient`] fetches manifests from the container registry
//!   (`ghcr.io`). It implements [`ghprune_core::ManifestResolver`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ghprune_registry::{PackagesClient, RegistryConfig, Scope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistryConfig::new("ghp_example");
//!     let scope = Scope::Organization("acme".to_string());
//!     let client = PackagesClient::new(&config, scope, "app")?;
//!
//!     let versions = client.list_all().await?;
//!     println!("{} versions", versions.len());
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod error;
mod manifest;
mod oci;
mod packages;

pub use config::{RegistryConfig, Scope, DEFAULT_API_URL, DEFAULT_REGISTRY_URL, MAX_PAGE_SIZE};
pub use error::RegistryError;
pub use ghprune_core::Platform;
pub use manifest::ManifestClient;
pub use oci::{ImageIndex, IndexEntry, MediaType};
pub use packages::{
    ContainerMetadata, PackageMetadata, PackageVersion, PackagesClient, GITHUB_API_VERSION,
    GITHUB_JSON,
};
