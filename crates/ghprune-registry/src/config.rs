//! Configuration types for the registry clients.

use std::fmt;
use std::time::Duration;

use crate::error::RegistryError;

/// Default GitHub REST API URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default container registry URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://ghcr.io";

/// Largest page size accepted by the packages API.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration shared by the packages and manifest clients.
#[derive(Clone)]
pub struct RegistryConfig {
    /// GitHub REST API URL (e.g., "<https://api.github.com>").
    pub api_url: String,

    /// Container registry URL (e.g., "<https://ghcr.io>").
    pub registry_url: String,

    /// Access token used for both services.
    pub token: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Number of versions requested per page.
    pub page_size: u32,
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("api_url", &self.api_url)
            .field("registry_url", &self.registry_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RegistryConfig {
    /// Creates a configuration for github.com with the given token.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghprune_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("ghp_example");
    /// assert_eq!(config.api_url, "https://api.github.com");
    /// assert_eq!(config.registry_url, "https://ghcr.io");
    /// ```
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            user_agent: format!("ghprune/{}", env!("CARGO_PKG_VERSION")),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Sets the REST API URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghprune_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("token")
    ///     .with_api_url("https://github.example.com/api/v3");
    /// assert_eq!(config.api_url, "https://github.example.com/api/v3");
    /// ```
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the container registry URL.
    #[must_use]
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the page size, clamped to `1..=100`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghprune_registry::RegistryConfig;
    ///
    /// assert_eq!(RegistryConfig::new("t").with_page_size(500).page_size, 100);
    /// assert_eq!(RegistryConfig::new("t").with_page_size(0).page_size, 1);
    /// ```
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

/// Whose packages a run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Packages of the user owning the token.
    AuthenticatedUser,

    /// Packages of a named user.
    User(String),

    /// Packages of a named organization.
    Organization(String),
}

impl Scope {
    /// Selects the scope from optional user and organization names.
    ///
    /// Empty names count as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if both a user and an organization are given.
    ///
    /// # Examples
    ///
    /// ```
    /// use ghprune_registry::Scope;
    ///
    /// assert_eq!(Scope::from_selectors(None, None).unwrap(), Scope::AuthenticatedUser);
    /// assert_eq!(
    ///     Scope::from_selectors(None, Some("acme")).unwrap(),
    ///     Scope::Organization("acme".to_string())
    /// );
    /// assert!(Scope::from_selectors(Some("octo"), Some("acme")).is_err());
    /// ```
    pub fn from_selectors(user: Option<&str>, organization: Option<&str>) -> Result<Self, RegistryError> {
        let user = user.map(str::trim).filter(|u| !u.is_empty());
        let organization = organization.map(str::trim).filter(|o| !o.is_empty());

        match (user, organization) {
            (Some(_), Some(_)) => Err(RegistryError::InvalidConfig {
                message: "user and organization are mutually exclusive".to_string(),
            }),
            (Some(user), None) => Ok(Self::User(user.to_string())),
            (None, Some(organization)) => Ok(Self::Organization(organization.to_string())),
            (None, None) => Ok(Self::AuthenticatedUser),
        }
    }

    /// Returns the owner name, if the scope names one.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::AuthenticatedUser => None,
            Self::User(name) | Self::Organization(name) => Some(name),
        }
    }

    /// Returns the REST path segments of the scope root.
    pub(crate) fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::AuthenticatedUser => vec!["user"],
            Self::User(name) => vec!["users", name],
            Self::Organization(name) => vec!["orgs", name],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticatedUser => write!(f, "authenticated user"),
            Self::User(name) => write!(f, "user {name}"),
            Self::Organization(name) => write!(f, "organization {name}"),
        }
    }
}
