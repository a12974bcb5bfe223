//! Registry manifest client.

use async_trait::async_trait;
use ghprune_core::{Manifest, ManifestResolver};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use crate::client::{authorization, build_http_client, join_segments, parse_base_url};
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::oci::{ImageIndex, MediaType};

/// Fetches manifests of one repository from the container registry.
///
/// GHCR accepts a personal access token as a bearer token once it is base64
/// encoded, which avoids the token exchange of the distribution API.
#[derive(Debug)]
pub struct ManifestClient {
    http: reqwest::Client,
    registry_url: Url,
    headers: HeaderMap,
    repository: String,
}

impl ManifestClient {
    /// Creates a client for the repository `{owner}/{container}`.
    ///
    /// Registry repository names are lowercase, so both parts are lowercased.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry URL or token is unusable, or the HTTP
    /// client cannot be created.
    pub fn new(config: &RegistryConfig, owner: &str, container: &str) -> Result<Self, RegistryError> {
        let token = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &config.token);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization("Bearer", &token)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&MediaType::accept_header()).map_err(|_| {
                RegistryError::InvalidConfig {
                    message: "invalid Accept header".to_string(),
                }
            })?,
        );

        Ok(Self {
            http: build_http_client(config)?,
            registry_url: parse_base_url(&config.registry_url)?,
            headers,
            repository: format!("{owner}/{container}").to_lowercase(),
        })
    }

    /// Returns the repository name.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Fetches the manifest `tag` points at, or `None` if the registry has
    /// none.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a manifest.
    pub async fn fetch(&self, tag: &str) -> Result<Option<Manifest>, RegistryError> {
        let url = self.manifest_url(tag)?;

        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(tag, repository = %self.repository, "no manifest for tag");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::from_response(response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await?;
        let index: ImageIndex = serde_json::from_slice(&body)?;

        Ok(Some(index.into_manifest(content_type.as_deref())))
    }

    /// Returns `{registry}/v2/{repository}/manifests/{tag}`.
    fn manifest_url(&self, tag: &str) -> Result<Url, RegistryError> {
        let segments = std::iter::once("v2")
            .chain(self.repository.split('/'))
            .chain(["manifests", tag]);
        join_segments(&self.registry_url, segments)
    }
}

#[async_trait]
impl ManifestResolver for ManifestClient {
    async fn resolve(&self, tag: &str) -> ghprune_core::Result<Option<Manifest>> {
        self.fetch(tag)
            .await
            .map_err(|e| ghprune_core::Error::manifest_resolution(tag, e))
    }
}
