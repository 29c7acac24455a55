//! Configuration error types for the JSON:API store.
//!
//! This module contains the error type returned while building a
//! [`StoreConfig`](crate::StoreConfig) and its validated newtypes.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_store::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during store configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide an absolute URL with scheme (e.g., 'https://api.example.com/v1').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid bearer token.")]
    EmptyAccessToken,

    /// A header name or value cannot be sent.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why the header was rejected.
        reason: String,
    },

    /// The retry count must allow at least one attempt.
    #[error("Invalid tries value {tries}. At least one attempt is required.")]
    InvalidTries {
        /// The rejected value.
        tries: u32,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
