//! Transport types for talking to a JSON:API server.
//!
//! The store never performs HTTP itself; it consumes a [`Transport`].
//!
//! # Overview
//!
//! - [`Transport`]: The capability the store depends on
//! - [`HttpClient`]: The `reqwest`-backed transport for real servers
//! - [`MockTransport`]: An in-memory transport for tests
//! - [`HttpRequest`] / [`HttpResponse`]: The request and response shapes
//! - [`HttpMethod`]: GET, POST, PATCH and DELETE
//! - [`HttpError`]: Transport failures
//!
//! # Retry Behavior
//!
//! [`HttpClient`] retries only `429 Too Many Requests`, honoring
//! `Retry-After` (or waiting one second), and only when
//! [`StoreConfig::tries`](crate::StoreConfig::tries) is above one. All
//! other statuses are handed back to the store unchanged.

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod mock;
mod transport;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, JSON_API_MEDIA_TYPE};
pub use http_response::HttpResponse;
pub use mock::{MockResponder, MockTransport};
pub use transport::Transport;
