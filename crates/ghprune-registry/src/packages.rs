//! GitHub Packages REST client.
//!
//! Lists and deletes the versions of one container package owned by the
//! authenticated user, a named user, or an organization.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghprune_core::{DeleteOperation, Version, VersionId, VersionSource};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{authorization, build_http_client, join_segments, parse_base_url};
use crate::config::{RegistryConfig, Scope, MAX_PAGE_SIZE};
use crate::error::RegistryError;

/// Media type requested from the REST API.
pub const GITHUB_JSON: &str = "application/vnd.github+json";

/// REST API version pinned by every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

const API_VERSION_HEADER: &str = "x-github-api-version";

/// A package version as returned by the REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Unique numeric id.
    pub id: u64,

    /// Manifest digest.
    pub name: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Package type specific metadata.
    #[serde(default)]
    pub metadata: Option<PackageMetadata>,
}

/// Package type specific metadata of a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Container metadata, present for container packages.
    #[serde(default)]
    pub container: Option<ContainerMetadata>,
}

/// Container metadata of a version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Tags pointing at the version.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PackageVersion {
    /// Returns the tags of the version, if any.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.metadata
            .as_ref()
            .and_then(|m| m.container.as_ref())
            .map(|c| c.tags.as_slice())
            .unwrap_or_default()
    }
}

impl From<PackageVersion> for Version {
    fn from(wire: PackageVersion) -> Self {
        let tags = wire.tags().to_vec();
        Self::new(wire.id, wire.name, wire.created_at).with_tags(tags)
    }
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

/// Client for the versions of one container package.
#[derive(Debug)]
pub struct PackagesClient {
    http: reqwest::Client,
    api_url: Url,
    headers: HeaderMap,
    page_size: u32,
    scope: Scope,
    container: String,
}

impl PackagesClient {
    /// Creates a client for `container` within `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL or token is unusable, or the HTTP
    /// client cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghprune_registry::{PackagesClient, RegistryConfig, Scope};
    ///
    /// let config = RegistryConfig::new("ghp_example");
    /// let client = PackagesClient::new(&config, Scope::Organization("acme".into()), "app")?;
    /// assert_eq!(client.container(), "app");
    /// # Ok::<(), ghprune_registry::RegistryError>(())
    /// ```
    pub fn new(
        config: &RegistryConfig,
        scope: Scope,
        container: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization("Bearer", &config.token)?);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(GITHUB_API_VERSION));

        Ok(Self {
            http: build_http_client(config)?,
            api_url: parse_base_url(&config.api_url)?,
            headers,
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            scope,
            container: container.into(),
        })
    }

    /// Returns the scope the client operates on.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the container name.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Fetches one page of versions, starting at page 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// decoded.
    pub async fn list_page(&self, page: u32) -> Result<Vec<PackageVersion>, RegistryError> {
        let mut url = self.versions_url(None)?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.page_size.to_string())
            .append_pair("page", &page.to_string());

        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::from_response(response).await);
        }

        let body = response.bytes().await?;
        let versions: Vec<PackageVersion> = serde_json::from_slice(&body)?;
        tracing::debug!(page, count = versions.len(), "fetched package versions");
        Ok(versions)
    }

    /// Fetches every version, page by page, until an empty or short page.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    pub async fn list_all(&self) -> Result<Vec<Version>, RegistryError> {
        let mut versions = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list_page(page).await?;
            let short = batch.is_empty()
                || u32::try_from(batch.len()).is_ok_and(|n| n < self.page_size);
            versions.extend(batch.into_iter().map(Version::from));
            if short {
                break;
            }
            page += 1;
        }

        Ok(versions)
    }

    /// Deletes one version.
    ///
    /// # Errors
    ///
    /// Returns an error if the service refuses the deletion.
    pub async fn delete_version(&self, id: VersionId) -> Result<(), RegistryError> {
        let url = self.versions_url(Some(&id.to_string()))?;

        let response = self
            .http
            .delete(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::from_response(response).await);
        }

        Ok(())
    }

    /// Returns the login of the user owning the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// decoded.
    pub async fn authenticated_login(&self) -> Result<String, RegistryError> {
        let url = join_segments(&self.api_url, ["user"])?;

        let response = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::from_response(response).await);
        }

        let body = response.bytes().await?;
        let user: AuthenticatedUser = serde_json::from_slice(&body)?;
        Ok(user.login)
    }

    /// Returns `{scope}/packages/container/{container}/versions[/{id}]`.
    fn versions_url(&self, id: Option<&str>) -> Result<Url, RegistryError> {
        let segments = self
            .scope
            .path_segments()
            .into_iter()
            .chain(["packages", "container", self.container.as_str(), "versions"])
            .chain(id);
        join_segments(&self.api_url, segments)
    }
}

#[async_trait]
impl VersionSource for PackagesClient {
    async fn list_versions(&self) -> ghprune_core::Result<Vec<Version>> {
        self.list_all().await.map_err(ghprune_core::Error::enumeration)
    }
}

#[async_trait]
impl DeleteOperation for PackagesClient {
    async fn delete(&self, version: &Version) -> ghprune_core::Result<()> {
        self.delete_version(version.id)
            .await
            .map_err(|e| ghprune_core::Error::deletion(version.id, e))?;
        tracing::info!(version_id = %version.id, name = %version.name, "pruned version");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(scope: Scope, container: &str) -> PackagesClient {
        PackagesClient::new(&RegistryConfig::new("token"), scope, container).unwrap()
    }

    #[test]
    fn test_versions_url_per_scope() {
        let org = client(Scope::Organization("acme".to_string()), "app");
        assert_eq!(
            org.versions_url(None).unwrap().as_str(),
            "https://api.github.com/orgs/acme/packages/container/app/versions"
        );

        let user = client(Scope::User("octo".to_string()), "app");
        assert_eq!(
            user.versions_url(Some("42")).unwrap().as_str(),
            "https://api.github.com/users/octo/packages/container/app/versions/42"
        );

        let me = client(Scope::AuthenticatedUser, "team/app");
        assert_eq!(
            me.versions_url(None).unwrap().as_str(),
            "https://api.github.com/user/packages/container/team%2Fapp/versions"
        );
    }

    #[test]
    fn test_page_size_is_clamped() {
        let mut config = RegistryConfig::new("token");
        config.page_size = 0;
        let low = PackagesClient::new(&config, Scope::AuthenticatedUser, "app").unwrap();
        assert_eq!(low.page_size, 1);

        config.page_size = 500;
        let high = PackagesClient::new(&config, Scope::AuthenticatedUser, "app").unwrap();
        assert_eq!(high.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_request_headers() {
        let client = client(Scope::AuthenticatedUser, "app");
        assert_eq!(client.headers.get(ACCEPT).unwrap(), GITHUB_JSON);
        assert_eq!(
            client.headers.get(API_VERSION_HEADER).unwrap(),
            GITHUB_API_VERSION
        );
        assert_eq!(client.headers.get(AUTHORIZATION).unwrap(), "Bearer token");
    }

    #[test]
    fn test_package_version_conversion() {
        let json = r#"{
            "id": 7,
            "name": "sha256:abc",
            "url": "https://api.github.com/orgs/acme/packages/container/app/versions/7",
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z",
            "metadata": {"package_type": "container", "container": {"tags": ["v1", "latest"]}}
        }"#;
        let wire: PackageVersion = serde_json::from_str(json).unwrap();
        let version = Version::from(wire);

        assert_eq!(version.id, VersionId::new(7));
        assert_eq!(version.name, "sha256:abc");
        assert_eq!(version.tags, vec!["v1", "latest"]);
    }

    #[test]
    fn test_package_version_without_metadata_is_untagged() {
        let json = r#"{"id": 8, "name": "sha256:def", "created_at": "2024-05-01T12:00:00Z"}"#;
        let wire: PackageVersion = serde_json::from_str(json).unwrap();
        assert!(wire.tags().is_empty());
        assert!(!Version::from(wire).is_tagged());
    }
}
