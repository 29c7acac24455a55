//! # JSON:API Store
//!
//! A client-side object mapper for REST APIs that follow the
//! [JSON:API](https://jsonapi.org) specification. Remote resources become
//! typed, relationship-aware local objects, and every read and write goes
//! through a per-store identity map.
//!
//! ## Overview
//!
//! This crate provides:
//! - Per-type declarations via [`ResourceSchema`] and [`ResourceClass`]
//! - [`Resource`] entities with typed attributes, to-one and to-many
//!   relationships, dirty tracking and JSON:API encode/decode
//! - Lazy relationship loading: related resources arrive as identifiers and
//!   are fetched on first access
//! - [`ResourceStore`], which caches one instance per `(type, id)` and
//!   orchestrates find, query, find-all, save and delete
//! - JSON:API error classification into [`ResourceError`]
//! - A `reqwest`-backed [`HttpClient`] configured through [`StoreConfig`]
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_store::{AttributeType, ResourceClass, ResourceSchemaBuilder};
//! use jsonapi_store::{BaseUrl, StoreConfig};
//!
//! struct Widget;
//!
//! impl ResourceClass for Widget {
//!     const TYPE: &'static str = "widget";
//!
//!     fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
//!         schema
//!             .attribute("title", AttributeType::String)
//!             .auto_saved_to_one("tag", "tag")
//!     }
//! }
//!
//! let config = StoreConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
//!     .header("X-Tenant", "acme")
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Loading and Saving
//!
//! ```rust,ignore
//! use jsonapi_store::ResourceStore;
//!
//! let mut store = ResourceStore::from_config(&config);
//! store.register::<Widget>();
//! store.register::<Tag>();
//!
//! // One request; later finds for the same id come from the cache
//! let widget = store.find("widget", "1", None).await?.expect("widget 1 exists");
//!
//! // Related resources load on first access
//! let tag = widget.related("tag", &store).await?;
//!
//! // Save sends auto-saved relationships first, then the widget itself
//! widget.write().set_attribute("title", "Sprocket")?;
//! widget.save(&store).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Stores and configuration are passed explicitly
//! - **Fail-fast validation**: Configuration newtypes validate on construction
//! - **One instance per resource**: A store never hands out two objects for
//!   the same `(type, id)`
//! - **Single-threaded resources**: [`ResourceHandle`] is `Rc`-based, so a
//!   store and its resources stay on one thread
//! - **Async-first**: Network operations are `async fn`s

pub mod clients;
pub mod config;
pub mod error;
pub mod resource;
pub mod store;

// Re-export public types at crate root for convenience
pub use config::{AccessToken, BaseUrl, StoreConfig, StoreConfigBuilder};
pub use error::ConfigError;

// Re-export transport types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError, MockTransport,
    Transport,
};

// Re-export the entity model
pub use resource::{
    AttributeType, AttributeValue, EncodeOptions, Reference, Resource, ResourceClass,
    ResourceCollection, ResourceError, ResourceHandle, ResourceIdentifier, ResourceSchema,
    ResourceSchemaBuilder, ResourceSnapshot, ToManyRelationship, ToOneRelationship,
};

// Re-export the store
pub use store::{QueryParams, ResourceStore};
