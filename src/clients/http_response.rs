//! HTTP response types for the JSON:API transport.

use std::collections::HashMap;

/// An HTTP response as seen by the store.
///
/// The body is kept as raw text; the store decides whether it is a valid
/// JSON:API document. An empty body (such as a `204 No Content` reply to a
/// DELETE) is reported as absent by [`HttpResponse::json_body`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lowercase name (headers may repeat).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: String,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the `Retry-After` header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: impl Into<String>) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0);

        Self {
            code,
            headers,
            body: body.into(),
            retry_request_after,
        }
    }

    /// Creates a response carrying a serialized JSON document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use jsonapi_store::clients::HttpResponse;
    /// use serde_json::json;
    ///
    /// let response = HttpResponse::json(200, &json!({"data": null}));
    /// assert!(response.is_ok());
    /// assert_eq!(response.json_body().unwrap().unwrap(), json!({"data": null}));
    /// ```
    #[must_use]
    pub fn json(code: u16, body: &serde_json::Value) -> Self {
        Self::new(code, HashMap::new(), body.to_string())
    }

    /// Creates a `204 No Content` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, HashMap::new(), String::new())
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns `true` if the body is empty or whitespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Parses the body as JSON.
    ///
    /// Returns `None` when the body is empty, otherwise the parse result.
    #[must_use]
    pub fn json_body(&self) -> Option<Result<serde_json::Value, serde_json::Error>> {
        if self.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&self.body))
        }
    }

    /// Returns the first value of a header, by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = HttpResponse::new(code, HashMap::new(), "");
            assert!(response.is_ok(), "Expected is_ok() to be true for code {code}");
        }
    }

    #[test]
    fn test_is_ok_returns_false_for_4xx_and_5xx() {
        for code in [400, 404, 422, 429, 500] {
            assert!(!HttpResponse::new(code, HashMap::new(), "").is_ok());
        }
    }

    #[test]
    fn test_no_content_has_absent_body() {
        let response = HttpResponse::no_content();
        assert_eq!(response.code, 204);
        assert!(response.json_body().is_none());
    }

    #[test]
    fn test_invalid_json_body_reports_parse_error() {
        let response = HttpResponse::new(200, HashMap::new(), "<html>");
        assert!(response.json_body().unwrap().is_err());
    }

    #[test]
    fn test_json_constructor_round_trips_body() {
        let body = json!({"meta": {"count": 2}});
        let response = HttpResponse::json(200, &body);
        assert_eq!(response.json_body().unwrap().unwrap(), body);
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), vec!["2.5".to_string()]);

        let response = HttpResponse::new(429, headers, "");
        assert!((response.retry_request_after.unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retry_after_ignores_unusable_values() {
        for value in ["-1", "NaN", "inf", "soon"] {
            let mut headers = HashMap::new();
            headers.insert("retry-after".to_string(), vec![value.to_string()]);

            let response = HttpResponse::new(429, headers, "");
            assert_eq!(response.retry_request_after, None, "Retry-After: {value}");
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["abc-123".to_string()]);

        let response = HttpResponse::new(200, headers, "");
        assert_eq!(response.header("X-Request-Id"), Some("abc-123"));
        assert_eq!(response.request_id(), Some("abc-123"));
    }
}
