//! Integration tests for the reqwest-backed transport.
//!
//! These tests run the client against a local mock server and verify the
//! headers it sends, how it reports statuses, and its 429 retry behavior.

use jsonapi_store::clients::{HttpClient, HttpMethod, HttpRequest, Transport};
use jsonapi_store::{
    AccessToken, AttributeType, BaseUrl, HttpError, ResourceClass, ResourceError,
    ResourceSchemaBuilder, ResourceStore, StoreConfig,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MEDIA_TYPE: &str = "application/vnd.api+json";

struct Widget;

impl ResourceClass for Widget {
    const TYPE: &'static str = "widget";

    fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
        schema.attribute("title", AttributeType::String)
    }
}

fn config_for(server: &MockServer) -> StoreConfig {
    StoreConfig::builder()
        .base_url(BaseUrl::new(format!("{}/api", server.uri())).unwrap())
        .access_token(AccessToken::new("secret-token").unwrap())
        .header("X-Tenant", "acme")
        .build()
        .unwrap()
}

// ============================================================================
// Request Building
// ============================================================================

#[tokio::test]
async fn test_get_sends_json_api_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .and(header("accept", MEDIA_TYPE))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Get, "widget/1")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.code, 200);
    assert_eq!(response.json_body().unwrap().unwrap(), json!({"data": null}));
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget"))
        .and(query_param("include", "tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Get, "widget")
        .query_param("include", "tag")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert!(response.is_ok());
}

#[tokio::test]
async fn test_patch_sends_json_body() {
    let server = MockServer::start().await;
    let document = json!({"data": {"id": "1", "type": "widget", "attributes": {"title": "Cog"}}});

    Mock::given(method("PATCH"))
        .and(path("/api/widget/1"))
        .and(header("content-type", MEDIA_TYPE))
        .and(body_json(&document))
        .respond_with(ResponseTemplate::new(200).set_body_json(&document))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Patch, "widget/1")
        .body(document.clone())
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.json_body().unwrap().unwrap(), document);
}

// ============================================================================
// Status Handling
// ============================================================================

#[tokio::test]
async fn test_no_content_has_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Delete, "widget/1")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.code, 204);
    assert!(response.json_body().is_none());
}

#[tokio::test]
async fn test_error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"status": "404", "detail": "No such widget"}]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Get, "widget/9")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.code, 404);
    assert!(!response.is_ok());
}

#[tokio::test]
async fn test_429_is_retried_when_allowed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .mount(&server)
        .await;

    let config = StoreConfig::builder()
        .base_url(BaseUrl::new(format!("{}/api", server.uri())).unwrap())
        .tries(3)
        .build()
        .unwrap();
    let client = HttpClient::new(&config);
    let request = HttpRequest::builder(HttpMethod::Get, "widget/1")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.code, 200);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_429_exhausts_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let config = StoreConfig::builder()
        .base_url(BaseUrl::new(format!("{}/api", server.uri())).unwrap())
        .tries(2)
        .build()
        .unwrap();
    let client = HttpClient::new(&config);
    let request = HttpRequest::builder(HttpMethod::Get, "widget/1")
        .build()
        .unwrap();

    let result = client.request(request).await;
    assert!(matches!(
        result,
        Err(HttpError::MaxRetries(ref e)) if e.code == 429 && e.tries == 2
    ));
}

#[tokio::test]
async fn test_429_without_retries_is_returned() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&config_for(&server));
    let request = HttpRequest::builder(HttpMethod::Get, "widget/1")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();
    assert_eq!(response.code, 429);
}

// ============================================================================
// Store Over HTTP
// ============================================================================

#[tokio::test]
async fn test_store_find_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"type": "widget", "id": "1", "attributes": {"title": "Sprocket"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = ResourceStore::from_config(&config_for(&server));
    store.register::<Widget>();

    let first = store.find("widget", "1", None).await.unwrap().unwrap();
    let second = store.find("widget", "1", None).await.unwrap().unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(
        first.read().attribute("title").unwrap().as_str(),
        Some("Sprocket")
    );
}

#[tokio::test]
async fn test_store_reports_server_failure_without_error_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/widget"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut store = ResourceStore::from_config(&config_for(&server));
    store.register::<Widget>();

    match store.find_all("widget", None).await {
        Err(ResourceError::Http(HttpError::Response(e))) => {
            assert_eq!(e.code, 503);
            assert_eq!(e.message, "maintenance");
        }
        other => panic!("Expected HTTP error, got {other:?}"),
    }
}
