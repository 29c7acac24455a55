//! HTTP client for JSON:API servers.
//!
//! This module provides the [`HttpClient`] type, the `reqwest`-backed
//! [`Transport`] used against real servers.

use std::collections::HashMap;

use crate::clients::errors::{HttpError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest, JSON_API_MEDIA_TYPE};
use crate::clients::http_response::HttpResponse;
use crate::clients::Transport;
use crate::config::{BaseUrl, StoreConfig};

/// Fixed retry wait time in seconds when no `Retry-After` is given.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to a JSON:API server.
///
/// The client handles:
/// - URL construction from the configured [`BaseUrl`]
/// - Default headers: JSON:API `Accept`/`Content-Type`, User-Agent,
///   `Authorization` when an access token is configured, plus any extra
///   configured headers
/// - Retries for 429 responses when the configuration allows more than one try
///
/// Every other status code is returned as a response; the store classifies
/// JSON:API error documents.
///
/// # Example
///
/// ```rust,ignore
/// use jsonapi_store::{HttpClient, StoreConfig, BaseUrl};
/// use jsonapi_store::clients::{HttpRequest, HttpMethod, Transport};
///
/// let config = StoreConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com").unwrap())
///     .build()
///     .unwrap();
///
/// let client = HttpClient::new(&config);
/// let request = HttpRequest::builder(HttpMethod::Get, "widgets/1").build().unwrap();
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: BaseUrl,
    default_headers: HashMap<String, String>,
    tries: u32,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the store configuration.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}JSON:API Store v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), JSON_API_MEDIA_TYPE.to_string());
        default_headers.insert("Content-Type".to_string(), JSON_API_MEDIA_TYPE.to_string());

        if let Some(token) = config.access_token() {
            default_headers.insert("Authorization".to_string(), token.authorization_value());
        }

        // Configured headers override the defaults
        for (key, value) in config.headers() {
            default_headers.insert(key.clone(), value.clone());
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            tries: config.tries(),
        }
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    fn calculate_retry_delay(response: &HttpResponse) -> std::time::Duration {
        response
            .retry_request_after
            .and_then(|seconds| std::time::Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or_else(|| std::time::Duration::from_secs(RETRY_WAIT_TIME))
    }
}

impl Transport for HttpClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = self.base_url.join(&request.path);

        let mut headers = self.default_headers.clone();
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
                HttpMethod::Patch => self.client.patch(&url),
                HttpMethod::Delete => self.client.delete(&url),
            };

            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }

            if let Some(query) = &request.query {
                req_builder = req_builder.query(query);
            }

            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            tracing::debug!("{} {}", request.http_method, url);

            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await.unwrap_or_default();

            let response = HttpResponse::new(code, res_headers, body_text);

            if code != 429 || self.tries <= 1 {
                return Ok(response);
            }

            if tries >= self.tries {
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: self.tries,
                }));
            }

            let delay = Self::calculate_retry_delay(&response);
            tracing::warn!(
                "Rate limited on {} {}, retrying in {:?} (attempt {} of {})",
                request.http_method,
                request.path,
                delay,
                tries,
                self.tries
            );
            tokio::time::sleep(delay).await;
        }
    }
}
