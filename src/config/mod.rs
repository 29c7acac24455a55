//! Configuration types for the JSON:API store.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`StoreConfig`]: Settings shared by the HTTP transport and the store
//! - [`StoreConfigBuilder`]: A builder for constructing [`StoreConfig`] instances
//! - [`BaseUrl`]: A validated server base URL
//! - [`AccessToken`]: A bearer token with masked debug output
//!
//! # Example
//!
//! ```rust
//! use jsonapi_store::{StoreConfig, BaseUrl, AccessToken};
//!
//! let config = StoreConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
//!     .access_token(AccessToken::new("token").unwrap())
//!     .to_many_replace(false)
//!     .build()
//!     .unwrap();
//!
//! assert!(!config.to_many_replace());
//! ```

mod newtypes;

use std::collections::HashMap;

pub use newtypes::{AccessToken, BaseUrl};

use crate::error::ConfigError;

/// Configuration for a [`ResourceStore`](crate::ResourceStore) and its
/// [`HttpClient`](crate::HttpClient).
///
/// # Thread Safety
///
/// `StoreConfig` is `Clone`, `Send`, and `Sync`; one configuration can back
/// several stores on different threads, each with its own cache.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    base_url: BaseUrl,
    access_token: Option<AccessToken>,
    headers: HashMap<String, String>,
    to_many_replace: bool,
    user_agent_prefix: Option<String>,
    tries: u32,
}

impl StoreConfig {
    /// Creates a new builder for constructing a `StoreConfig`.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// Returns the server base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the bearer token, if configured.
    #[must_use]
    pub const fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// Returns the extra headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns whether PATCH requests replace to-many relationships in full.
    ///
    /// When `false`, to-many relationships are left out of update documents
    /// so the server leaves them untouched.
    #[must_use]
    pub const fn to_many_replace(&self) -> bool {
        self.to_many_replace
    }

    /// Returns the User-Agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns how many attempts the HTTP client makes for rate limited requests.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }
}

// Verify StoreConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StoreConfig>();
};

/// Builder for constructing [`StoreConfig`] instances.
///
/// Only the base URL is required. Defaults: no access token, no extra
/// headers, `to_many_replace = true`, one attempt per request.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    base_url: Option<BaseUrl>,
    access_token: Option<AccessToken>,
    headers: HashMap<String, String>,
    to_many_replace: Option<bool>,
    user_agent_prefix: Option<String>,
    tries: Option<u32>,
}

impl StoreConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets whether PATCH requests replace to-many relationships.
    #[must_use]
    pub const fn to_many_replace(mut self, enabled: bool) -> Self {
        self.to_many_replace = Some(enabled);
        self
    }

    /// Sets the User-Agent prefix.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets how many attempts are made for rate limited (429) requests.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Builds the [`StoreConfig`], validating all fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if no base URL was set,
    /// [`ConfigError::InvalidHeader`] if a header contains control characters,
    /// and [`ConfigError::InvalidTries`] if `tries` is zero.
    pub fn build(self) -> Result<StoreConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        for (name, value) in &self.headers {
            if name.is_empty() {
                return Err(ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: "header name is empty".to_string(),
                });
            }
            if name.chars().chain(value.chars()).any(char::is_control) {
                return Err(ConfigError::InvalidHeader {
                    name: name.clone(),
                    reason: "contains control characters".to_string(),
                });
            }
        }

        let tries = self.tries.unwrap_or(1);
        if tries == 0 {
            return Err(ConfigError::InvalidTries { tries });
        }

        Ok(StoreConfig {
            base_url,
            access_token: self.access_token,
            headers: self.headers,
            to_many_replace: self.to_many_replace.unwrap_or(true),
            user_agent_prefix: self.user_agent_prefix,
            tries,
        })
    }
}
