//! In-memory transport for tests.
//!
//! [`MockTransport`] answers requests from canned responses and records
//! every request it sees, so tests can assert on exactly which network
//! calls the store made.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_store::clients::{HttpMethod, MockTransport};
//! use serde_json::json;
//!
//! let transport = MockTransport::new();
//! transport
//!     .expect(HttpMethod::Get, "widgets/1")
//!     .respond_json(200, &json!({"data": {"type": "widget", "id": "1"}}));
//!
//! assert_eq!(transport.request_count(), 0);
//! ```
//!
//! Clones share state: hand one clone to the store and keep another to
//! inspect the recorded requests.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::clients::{HttpError, HttpMethod, HttpRequest, HttpResponse, Transport};

#[derive(Debug)]
struct Expectation {
    method: HttpMethod,
    path: String,
    response: HttpResponse,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<Expectation>,
    requests: Vec<HttpRequest>,
}

/// A [`Transport`] that serves canned responses.
///
/// Expectations are matched on method and path, in the order they were
/// registered. Each expectation answers once unless [`MockResponder::times`]
/// or [`MockResponder::always`] says otherwise. A request with no matching
/// expectation gets a JSON:API `404` error document.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    /// Creates a transport with no expectations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an expectation for `method` on `path`.
    #[must_use]
    pub fn expect(&self, method: HttpMethod, path: impl Into<String>) -> MockResponder<'_> {
        MockResponder {
            transport: self,
            method,
            path: path.into(),
            remaining: Some(1),
        }
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().requests.clone()
    }

    /// Returns the number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Returns the most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.state.borrow().requests.last().cloned()
    }

    fn register(&self, expectation: Expectation) {
        self.state.borrow_mut().expectations.push(expectation);
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        let matched = state.expectations.iter_mut().find(|e| {
            e.method == request.http_method
                && e.path == request.path
                && e.remaining.map_or(true, |n| n > 0)
        });

        match matched {
            Some(expectation) => {
                if let Some(remaining) = expectation.remaining.as_mut() {
                    *remaining -= 1;
                }
                expectation.response.clone()
            }
            None => HttpResponse::json(
                404,
                &json!({
                    "errors": [{
                        "status": "404",
                        "detail": format!(
                            "No mock response for {} {}",
                            request.http_method, request.path
                        ),
                    }]
                }),
            ),
        }
    }
}

impl Transport for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;
        Ok(self.respond(&request))
    }
}

/// Builder returned by [`MockTransport::expect`].
#[derive(Debug)]
#[must_use = "an expectation is only registered once a response is supplied"]
pub struct MockResponder<'a> {
    transport: &'a MockTransport,
    method: HttpMethod,
    path: String,
    remaining: Option<usize>,
}

impl MockResponder<'_> {
    /// Answers `n` matching requests instead of one.
    pub const fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }

    /// Answers every matching request.
    pub const fn always(mut self) -> Self {
        self.remaining = None;
        self
    }

    /// Registers the expectation with a full response.
    pub fn respond_with(self, response: HttpResponse) {
        self.transport.register(Expectation {
            method: self.method,
            path: self.path,
            response,
            remaining: self.remaining,
        });
    }

    /// Registers the expectation with a JSON body.
    pub fn respond_json(self, code: u16, body: &serde_json::Value) {
        self.respond_with(HttpResponse::json(code, body));
    }

    /// Registers the expectation with a `204 No Content` reply.
    pub fn respond_no_content(self) {
        self.respond_with(HttpResponse::no_content());
    }
}
