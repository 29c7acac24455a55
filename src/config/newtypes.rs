//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated base URL for a JSON:API server.
///
/// The URL must carry an alphabetic scheme and a non-empty host. A trailing
/// slash is stripped so that resource addresses can be joined with a single
/// `/`.
///
/// # Serialization
///
/// `BaseUrl` serializes to and deserializes from its normalized string form:
///
/// ```rust
/// use jsonapi_store::BaseUrl;
///
/// let url = BaseUrl::new("https://api.example.com/v1/").unwrap();
/// let json = serde_json::to_string(&url).unwrap();
/// assert_eq!(json, r#""https://api.example.com/v1""#);
/// ```
///
/// # Example
///
/// ```rust
/// use jsonapi_store::BaseUrl;
///
/// let url = BaseUrl::new("https://api.example.com/v1").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "api.example.com");
/// assert_eq!(url.join("widgets/1"), "https://api.example.com/v1/widgets/1");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: String,
    scheme_end: usize,
    host_start: usize,
    host_end: usize,
}

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL has no scheme or host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidBaseUrl { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        let host_start = scheme_end + 3;
        if host_start >= url.len() {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        // Host ends at port, path, query, or end of string
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(ConfigError::InvalidBaseUrl { url: url.clone() });
        }

        Ok(Self {
            url,
            scheme_end,
            host_start,
            host_end,
        })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Joins a relative resource address onto this base URL.
    #[must_use]
    pub fn join(&self, address: &str) -> String {
        let address = address.trim_start_matches('/');
        if address.is_empty() {
            self.url.clone()
        } else {
            format!("{}/{address}", self.url)
        }
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A bearer token sent in the `Authorization` header.
///
/// # Security
///
/// The `Debug` implementation masks the token, displaying only
/// `AccessToken(*****)` instead of the actual value.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::AccessToken;
///
/// let token = AccessToken::new("my-token").unwrap();
/// assert_eq!(format!("{:?}", token), "AccessToken(*****)");
/// assert_eq!(token.authorization_value(), "Bearer my-token");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new validated access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self(token))
    }

    /// Returns the value for the `Authorization` header.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}
