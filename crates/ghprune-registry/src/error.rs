//! Error types for registry operations.

use thiserror::Error;

/// Errors that can occur while talking to GitHub Packages or the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to the remote service.
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        /// Request URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The token was rejected or cannot be sent.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message.
        message: String,
    },

    /// The requested package or version does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Path of the missing resource.
        resource: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP error: {status} - {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    JsonError {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A base URL cannot be used to build request URLs.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// The client is missing a setting the operation needs.
    #[error("Invalid registry configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl RegistryError {
    /// Maps an unsuccessful response to an error, consuming its body.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let resource = response.url().path().to_string();
        match status.as_u16() {
            401 | 403 => Self::AuthenticationFailed {
                message: format!("{status}: {}", response.text().await.unwrap_or_default()),
            },
            404 => Self::NotFound { resource },
            code => Self::HttpError {
                status: code,
                message: response.text().await.unwrap_or_default(),
            },
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else if err.is_status() {
            let status = err.status().map_or(0, |s| s.as_u16());
            Self::HttpError {
                status,
                message: err.to_string(),
            }
        } else {
            Self::HttpError {
                status: 0,
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = RegistryError::NotFound {
            resource: "/orgs/acme/packages/container/app/versions".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Not found: /orgs/acme/packages/container/app/versions"
        );
    }

    #[test]
    fn test_error_display_http() {
        let err = RegistryError::HttpError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: 500 - boom");
    }

    #[test]
    fn test_error_display_auth_failed() {
        let err = RegistryError::AuthenticationFailed {
            message: "invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "Authentication failed: invalid token");
    }

    #[test]
    fn test_json_error_conversion() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RegistryError::from(source);
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
