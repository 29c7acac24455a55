//! Transport-level error types.
//!
//! This module contains error types for HTTP operations: response errors,
//! retry exhaustion, and request validation failures. JSON:API error
//! documents are *not* interpreted here; the store classifies them into
//! [`ResourceError`](crate::ResourceError) variants.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonapi_store::clients::{HttpClient, HttpRequest, HttpMethod, HttpError, Transport};
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Status {}", response.code),
//!     Err(HttpError::MaxRetries(e)) => println!("Gave up after {} tries", e.tries),
//!     Err(HttpError::InvalidRequest(e)) => println!("Invalid request: {}", e),
//!     Err(HttpError::Network(e)) => println!("Network error: {}", e),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//! }
//! ```

use thiserror::Error;

/// Error for a non-successful response that carried no JSON:API error document.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 502,
///     message: "Bad Gateway".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "HTTP 502: Bad Gateway");
/// ```
#[derive(Debug, Error)]
#[error("HTTP {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// The raw response body, or a short description when the body was empty.
    pub message: String,
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// Raised when a request keeps receiving 429 responses after all
/// configured attempts have been made.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last status: {code}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
}

/// Error returned when an HTTP request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// A GET or DELETE request was given a body.
    #[error("Cannot send a body with {method}.")]
    UnexpectedBody {
        /// The HTTP method that forbids a body.
        method: String,
    },
}

/// Unified error type for all transport errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response without a JSON:API error document.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
