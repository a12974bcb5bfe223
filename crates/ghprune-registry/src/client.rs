//! HTTP plumbing shared by the packages and manifest clients.

use reqwest::header::{HeaderValue, InvalidHeaderValue};
use url::Url;

use crate::config::RegistryConfig;
use crate::error::RegistryError;

/// Builds the HTTP client with the configured timeout and user agent.
pub(crate) fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| RegistryError::ConnectionFailed {
            url: config.api_url.clone(),
            source: e,
        })
}

/// Parses a base URL that path segments can be appended to.
pub(crate) fn parse_base_url(url: &str) -> Result<Url, RegistryError> {
    let parsed = Url::parse(url).map_err(|_| RegistryError::InvalidUrl {
        url: url.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(RegistryError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(parsed)
}

/// Appends `segments` to the path of `base`.
///
/// Each segment is percent-encoded on its own, so a `/` inside a segment
/// becomes `%2F`.
pub(crate) fn join_segments<'s, I>(base: &Url, segments: I) -> Result<Url, RegistryError>
where
    I: IntoIterator<Item = &'s str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RegistryError::InvalidUrl {
            url: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Creates a sensitive `Authorization` header value.
pub(crate) fn authorization(scheme: &str, credentials: &str) -> Result<HeaderValue, RegistryError> {
    let mut value = HeaderValue::from_str(&format!("{scheme} {credentials}")).map_err(
        |_: InvalidHeaderValue| RegistryError::AuthenticationFailed {
            message: "Invalid token".to_string(),
        },
    )?;
    value.set_sensitive(true);
    Ok(value)
}
