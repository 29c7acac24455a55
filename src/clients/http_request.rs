//! HTTP request types for the JSON:API transport.
//!
//! This module provides the [`HttpRequest`] type and its builder.

use std::collections::HashMap;
use std::fmt;

use crate::clients::errors::InvalidHttpRequestError;

/// The JSON:API media type used for `Accept` and `Content-Type`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// HTTP methods used by the JSON:API resource protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Fetch a resource or collection.
    Get,
    /// Create a resource.
    Post,
    /// Partially update a resource.
    Patch,
    /// Delete a resource.
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    const fn requires_body(self) -> bool {
        matches!(self, Self::Post | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request addressed relative to the transport's base URL.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::clients::{HttpRequest, HttpMethod};
/// use serde_json::json;
///
/// let get_request = HttpRequest::builder(HttpMethod::Get, "widgets/1")
///     .query_param("include", "tags")
///     .build()
///     .unwrap();
///
/// let post_request = HttpRequest::builder(HttpMethod::Post, "widgets")
///     .body(json!({"data": {"type": "widget", "attributes": {}}}))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The resource address (relative to the base URL).
    pub path: String,
    /// The JSON:API document to send, if any.
    pub body: Option<serde_json::Value>,
    /// Query parameters to append to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Additional headers to include in the request.
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, path)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if a POST/PATCH has no body, or a
    /// GET/DELETE carries one.
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.http_method.requires_body() && self.body.is_none() {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            });
        }

        if !self.http_method.requires_body() && self.body.is_some() {
            return Err(InvalidHttpRequestError::UnexpectedBody {
                method: self.http_method.to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    path: String,
    body: Option<serde_json::Value>,
    query: Option<HashMap<String, String>>,
    extra_headers: Option<HashMap<String, String>>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            http_method: method,
            path: path.into(),
            body: None,
            query: None,
            extra_headers: None,
        }
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets all query parameters at once. An empty map sends no query string.
    #[must_use]
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query = if query.is_empty() { None } else { Some(query) };
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            path: self.path,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
        };
        request.verify()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_builder_creates_valid_get_request() {
        let request = HttpRequest::builder(HttpMethod::Get, "widgets/1")
            .build()
            .unwrap();

        assert_eq!(request.http_method, HttpMethod::Get);
        assert_eq!(request.path, "widgets/1");
        assert!(request.body.is_none());
        assert!(request.query.is_none());
    }

    #[test]
    fn test_verify_requires_body_for_patch() {
        let result = HttpRequest::builder(HttpMethod::Patch, "widgets/1").build();

        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::MissingBody { method }) if method == "PATCH"
        ));
    }

    #[test]
    fn test_verify_rejects_body_on_delete() {
        let result = HttpRequest::builder(HttpMethod::Delete, "widgets/1")
            .body(json!({}))
            .build();

        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::UnexpectedBody { .. })
        ));
    }

    #[test]
    fn test_empty_query_map_sends_no_query() {
        let request = HttpRequest::builder(HttpMethod::Get, "widgets")
            .query(HashMap::new())
            .build()
            .unwrap();
        assert!(request.query.is_none());
    }

    #[test]
    fn test_builder_with_query_params_and_headers() {
        let request = HttpRequest::builder(HttpMethod::Get, "widgets")
            .query_param("page[size]", "10")
            .header("X-Trace", "abc")
            .build()
            .unwrap();

        assert_eq!(
            request.query.unwrap().get("page[size]"),
            Some(&"10".to_string())
        );
        assert_eq!(
            request.extra_headers.unwrap().get("X-Trace"),
            Some(&"abc".to_string())
        );
    }
}
