//! The transport capability consumed by the resource store.

use crate::clients::{HttpError, HttpRequest, HttpResponse};

/// Something that can carry a JSON:API request to a server.
///
/// Implementations return every HTTP status as an [`HttpResponse`]; only
/// failures to obtain a response at all (network errors, exhausted retries,
/// invalid requests) are reported as [`HttpError`]. Interpreting JSON:API
/// error documents is the store's job.
///
/// The crate ships [`HttpClient`](crate::HttpClient) for real servers and
/// [`MockTransport`](crate::clients::MockTransport) for tests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends a request and waits for its response.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
