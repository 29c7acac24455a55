//! The resource store: identity map plus request orchestration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest, Transport};
use crate::config::StoreConfig;
use crate::resource::{
    EncodeOptions, Resource, ResourceClass, ResourceCollection, ResourceError, ResourceHandle,
    ResourceIdentifier, ResourceSchema,
};
use crate::store::document::{fetched_date, parse_response, primary_data};
use crate::store::{resource_address, ClassRegistry};

/// Query parameters appended to GET requests (`include`, `filter[...]`, ...).
pub type QueryParams = HashMap<String, String>;

type Cache = HashMap<String, IndexMap<String, ResourceHandle>>;

/// A cache of JSON:API resources backed by a [`Transport`].
///
/// The store keeps at most one [`ResourceHandle`] per `(type, id)` for its
/// whole lifetime. Loading a resource that is already cached refreshes the
/// cached instance in place, so every holder of a handle sees the new data.
/// Entries are only removed by a successful [`delete`](Self::delete).
///
/// Resource types must be registered before documents of that type can be
/// decoded.
///
/// # Example
///
/// ```rust,ignore
/// use jsonapi_store::{BaseUrl, ResourceStore, StoreConfig};
///
/// let config = StoreConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com/v1")?)
///     .build()?;
///
/// let mut store = ResourceStore::from_config(&config);
/// store.register::<Widget>();
///
/// if let Some(widget) = store.find("widget", "1", None).await? {
///     widget.write().set_attribute("title", "Sprocket")?;
///     widget.save(&store).await?;
/// }
/// ```
#[derive(Debug)]
pub struct ResourceStore<T> {
    transport: Option<T>,
    to_many_replace: bool,
    registry: ClassRegistry,
    cache: RefCell<Cache>,
}

impl ResourceStore<HttpClient> {
    /// Creates a store that talks to the server described by `config`.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::with_config(HttpClient::new(config), config)
    }
}

impl<T> ResourceStore<T> {
    /// Creates a store using `transport`, sending to-many relationships in
    /// full on update.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            to_many_replace: true,
            registry: ClassRegistry::new(),
            cache: RefCell::new(Cache::new()),
        }
    }

    /// Creates a store using `transport` with settings from `config`.
    #[must_use]
    pub fn with_config(transport: T, config: &StoreConfig) -> Self {
        let mut store = Self::new(transport);
        store.to_many_replace = config.to_many_replace();
        store
    }

    /// Creates a store without a transport.
    ///
    /// Cache-only operations work; anything that needs the network fails
    /// with [`ResourceError::NoResourceStore`] until [`attach`](Self::attach)
    /// is called.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            transport: None,
            to_many_replace: true,
            registry: ClassRegistry::new(),
            cache: RefCell::new(Cache::new()),
        }
    }

    /// Attaches (or replaces) the transport.
    pub fn attach(&mut self, transport: T) {
        self.transport = Some(transport);
    }

    /// Returns `true` when a transport is attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    fn transport(&self) -> Result<&T, ResourceError> {
        self.transport.as_ref().ok_or(ResourceError::NoResourceStore)
    }

    /// Returns whether updates send to-many relationships in full.
    #[must_use]
    pub const fn to_many_replace(&self) -> bool {
        self.to_many_replace
    }

    /// Sets whether updates send to-many relationships in full.
    pub fn set_to_many_replace(&mut self, to_many_replace: bool) {
        self.to_many_replace = to_many_replace;
    }

    // Registry

    /// Registers `schema` for `type_name`.
    pub fn add_class(&mut self, type_name: impl Into<String>, schema: ResourceSchema) {
        self.registry.add_class(type_name, schema);
    }

    /// Registers a statically declared resource type.
    pub fn register<C: ResourceClass>(&mut self) {
        self.registry.register::<C>();
    }

    /// Returns `true` when `type_name` is registered.
    #[must_use]
    pub fn has_class(&self, type_name: &str) -> bool {
        self.registry.has_class(type_name)
    }

    /// Returns the schema registered for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ClassNotFound`] when nothing is registered.
    pub fn get_class(&self, type_name: &str) -> Result<Arc<ResourceSchema>, ResourceError> {
        self.registry.get_class(type_name)
    }

    /// Creates a new, unsaved resource of a registered type.
    ///
    /// The resource is not cached until it has been saved.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ClassNotFound`] when `type_name` is not
    /// registered.
    pub fn create(&self, type_name: &str) -> Result<ResourceHandle, ResourceError> {
        let schema = self.registry.get_class(type_name)?;
        Ok(ResourceHandle::new(Resource::new(schema)))
    }

    // Cache

    /// Returns the cached resource for `(type_name, id)` without any request.
    #[must_use]
    pub fn peek(&self, type_name: &str, id: &str) -> Option<ResourceHandle> {
        self.cache
            .borrow()
            .get(type_name)
            .and_then(|resources| resources.get(id))
            .cloned()
    }

    /// Returns every cached resource of `type_name`, in the order they were
    /// first cached.
    #[must_use]
    pub fn peek_all(&self, type_name: &str) -> ResourceCollection {
        let mut collection = ResourceCollection::new(type_name);
        let handles: Vec<ResourceHandle> = self
            .cache
            .borrow()
            .get(type_name)
            .map(|resources| resources.values().cloned().collect())
            .unwrap_or_default();

        for handle in handles {
            if let Err(e) = collection.add(handle) {
                tracing::warn!("Skipping cached {} resource: {}", type_name, e);
            }
        }
        collection
    }

    fn cache_insert(&self, handle: &ResourceHandle) {
        let identifier = handle.identifier();
        if !identifier.is_saved() {
            return;
        }
        self.cache
            .borrow_mut()
            .entry(identifier.type_name().to_string())
            .or_default()
            .insert(identifier.id().to_string(), handle.clone());
    }

    fn evict(&self, identifier: &ResourceIdentifier) {
        if let Some(resources) = self.cache.borrow_mut().get_mut(identifier.type_name()) {
            resources.shift_remove(identifier.id());
        }
    }

    /// Decodes `data` into the cached instance for its `(type, id)`, or into a
    /// new instance of the registered schema, and caches the result.
    fn load(
        &self,
        data: &Value,
        fetched: DateTime<Utc>,
    ) -> Result<ResourceHandle, ResourceError> {
        let identifier = ResourceIdentifier::decode(data)?;

        if let Some(cached) = self.peek(identifier.type_name(), identifier.id()) {
            let Some(mut resource) = cached.try_write() else {
                return Err(ResourceError::ResourceInUse {
                    type_name: identifier.type_name().to_string(),
                    id: identifier.id().to_string(),
                });
            };
            resource.decode(data)?;
            resource.set_fetched_date(Some(fetched));
            drop(resource);
            return Ok(cached);
        }

        let mut resource = Resource::new(self.registry.get_class(identifier.type_name())?);
        resource.decode(data)?;
        resource.set_fetched_date(Some(fetched));
        let handle = ResourceHandle::new(resource);
        self.cache_insert(&handle);
        Ok(handle)
    }

    /// Caches every registered resource in the document's `included` array.
    fn load_included(&self, body: &Value, fetched: DateTime<Utc>) -> Result<(), ResourceError> {
        let Some(included) = body.get("included").and_then(Value::as_array) else {
            return Ok(());
        };

        for data in included {
            let identifier = ResourceIdentifier::decode(data)?;
            if self.has_class(identifier.type_name()) {
                self.load(data, fetched)?;
            } else {
                tracing::debug!("Ignoring included {}: type is not registered", identifier);
            }
        }
        Ok(())
    }
}

impl<T: Transport> ResourceStore<T> {
    async fn send(&self, request: HttpRequest) -> Result<Option<Value>, ResourceError> {
        let transport = self.transport()?;
        tracing::debug!("{} {}", request.http_method, request.path);
        let response = transport.request(request).await?;
        parse_response(&response)
    }

    fn get_request(path: String, query: Option<&QueryParams>) -> Result<HttpRequest, ResourceError> {
        let mut builder = HttpRequest::builder(HttpMethod::Get, path);
        if let Some(query) = query {
            builder = builder.query(query.clone());
        }
        Ok(builder.build().map_err(HttpError::from)?)
    }

    /// Returns the resource for `(type_name, id)`, from the cache when possible.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub async fn find(
        &self,
        type_name: &str,
        id: &str,
        query: Option<&QueryParams>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        if let Some(handle) = self.peek(type_name, id) {
            tracing::debug!("Cache hit for {}/{}", type_name, id);
            return Ok(Some(handle));
        }

        tracing::debug!("Cache miss for {}/{}", type_name, id);
        self.query(type_name, id, query).await
    }

    /// Fetches `(type_name, id)` from the server, bypassing the cache.
    ///
    /// A cached instance is refreshed in place and returned. Resources in the
    /// document's `included` array are cached as well. Returns `Ok(None)`
    /// when the server reports `404` or answers with `"data": null`.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NoResourceStore`] without a transport
    /// - [`ResourceError::ClassNotFound`] for an unregistered type
    /// - [`ResourceError::ErrorResponse`] for any other JSON:API error
    /// - [`ResourceError::InvalidJson`] / [`ResourceError::InvalidData`] for
    ///   malformed documents
    /// - [`ResourceError::Http`] for transport failures
    pub async fn query(
        &self,
        type_name: &str,
        id: &str,
        query: Option<&QueryParams>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        self.transport()?;
        self.registry.get_class(type_name)?;

        let request = Self::get_request(resource_address(type_name, Some(id)), query)?;
        let body = match self.send(request).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                return Err(ResourceError::invalid_data(
                    "Response has no body.",
                    &Value::Null,
                ))
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("{}/{} not found: {}", type_name, id, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let data = primary_data(&body)?;
        if data.is_null() {
            return Ok(None);
        }

        let identifier = ResourceIdentifier::decode(data)?;
        if identifier.type_name() != type_name {
            return Err(ResourceError::invalid_type(type_name, identifier.type_name()));
        }

        let fetched = fetched_date(&body).unwrap_or_else(Utc::now);
        let handle = self.load(data, fetched)?;
        self.load_included(&body, fetched)?;
        Ok(Some(handle))
    }

    /// Fetches every resource of `type_name`.
    ///
    /// Each member is cached (refreshing cached instances in place). The
    /// returned collection is fully loaded and carries the document's `meta`.
    ///
    /// # Errors
    ///
    /// As [`query`](Self::query), except that `404` is an error here, and
    /// [`ResourceError::InvalidData`] when `data` is not an array.
    pub async fn find_all(
        &self,
        type_name: &str,
        query: Option<&QueryParams>,
    ) -> Result<ResourceCollection, ResourceError> {
        self.transport()?;
        self.registry.get_class(type_name)?;

        let request = Self::get_request(resource_address(type_name, None), query)?;
        let body = self.send(request).await?.ok_or_else(|| {
            ResourceError::invalid_data("Response has no body.", &Value::Null)
        })?;

        let Some(items) = primary_data(&body)?.as_array() else {
            return Err(ResourceError::invalid_data(
                "Collection response \"data\" must be an array.",
                &body,
            ));
        };

        let fetched = fetched_date(&body).unwrap_or_else(Utc::now);
        let mut collection = ResourceCollection::new(type_name);
        for data in items {
            let identifier = ResourceIdentifier::decode(data)?;
            if identifier.type_name() != type_name {
                return Err(ResourceError::invalid_type(type_name, identifier.type_name()));
            }
            collection.add(self.load(data, fetched)?)?;
        }
        self.load_included(&body, fetched)?;

        collection.set_meta(body.get("meta").cloned());
        Ok(collection)
    }

    /// Sends `resource` to the server and decodes the reply into it.
    ///
    /// An unsaved resource is POSTed to `{type}` with every relationship; a
    /// saved one is PATCHed to `{type}/{id}`, sending to-many relationships
    /// only when [`to_many_replace`](Self::to_many_replace) is set. The
    /// resource is cached under its (possibly new) id and left clean.
    ///
    /// This sends exactly one request. [`ResourceHandle::save`] adds the
    /// auto-save cascade and skips unmodified resources.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NoResourceStore`] without a transport
    /// - [`ResourceError::NotFound`] / [`ResourceError::ErrorResponse`] for
    ///   JSON:API errors
    /// - [`ResourceError::InvalidData`] when the reply has no `data`
    /// - [`ResourceError::InvalidJson`] / [`ResourceError::Http`] as for
    ///   [`query`](Self::query)
    pub async fn save(&self, resource: &ResourceHandle) -> Result<(), ResourceError> {
        self.transport()?;

        let request = {
            let resource = resource.read();
            let (method, options) = if resource.is_saved() {
                (
                    HttpMethod::Patch,
                    EncodeOptions {
                        to_many_replace: self.to_many_replace,
                    },
                )
            } else {
                (HttpMethod::Post, EncodeOptions::default())
            };

            HttpRequest::builder(
                method,
                resource_address(resource.type_name(), Some(resource.id())),
            )
            .body(resource.encode(&options))
            .build()
            .map_err(HttpError::from)?
        };

        let body = self.send(request).await?.ok_or_else(|| {
            ResourceError::invalid_data("Response to save has no body.", &Value::Null)
        })?;
        let data = primary_data(&body)?;

        let fetched = fetched_date(&body).unwrap_or_else(Utc::now);
        {
            let mut resource = resource.write();
            resource.decode(data)?;
            resource.set_fetched_date(Some(fetched));
        }
        self.cache_insert(resource);
        self.load_included(&body, fetched)?;
        Ok(())
    }

    /// Deletes `resource` on the server and evicts it from the cache.
    ///
    /// Does nothing for a resource that was never saved. The local object is
    /// left as it is.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save), except that an empty reply is success.
    pub async fn delete(&self, resource: &ResourceHandle) -> Result<(), ResourceError> {
        let identifier = resource.identifier();
        if !identifier.is_saved() {
            return Ok(());
        }
        self.transport()?;

        let request = HttpRequest::builder(
            HttpMethod::Delete,
            resource_address(identifier.type_name(), Some(identifier.id())),
        )
        .build()
        .map_err(HttpError::from)?;

        self.send(request).await?;
        self.evict(&identifier);
        Ok(())
    }
}
