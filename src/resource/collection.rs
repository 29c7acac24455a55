//! Ordered, id-keyed collections of related resources.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::clients::Transport;
use crate::resource::{Reference, ResourceError, ResourceHandle, ResourceIdentifier};
use crate::store::ResourceStore;

/// An ordered set of resources of one type, keyed by id.
///
/// Members may be bare identifiers until they are needed. [`get`] and
/// [`resources`] load unresolved members through the store and keep the
/// loaded resource in place of the identifier. [`keys`], [`len`] and
/// [`contains`] never touch the store.
///
/// [`get`]: ResourceCollection::get
/// [`resources`]: ResourceCollection::resources
/// [`keys`]: ResourceCollection::keys
/// [`len`]: ResourceCollection::len
/// [`contains`]: ResourceCollection::contains
#[derive(Clone, Debug)]
pub struct ResourceCollection {
    declared_type: String,
    elements: IndexMap<String, Reference>,
    meta: Option<Value>,
}

impl ResourceCollection {
    /// Creates an empty collection of `declared_type` resources.
    #[must_use]
    pub fn new(declared_type: impl Into<String>) -> Self {
        Self {
            declared_type: declared_type.into(),
            elements: IndexMap::new(),
            meta: None,
        }
    }

    /// Builds a collection from decoded identifiers, reusing members of
    /// `previous` that were already loaded.
    pub(crate) fn from_decoded(
        declared_type: String,
        identifiers: Vec<ResourceIdentifier>,
        previous: Option<&Self>,
    ) -> Self {
        let mut collection = Self::new(declared_type);
        for identifier in identifiers {
            let reference = previous
                .and_then(|previous| previous.elements.get(identifier.id()))
                .filter(|existing| existing.is_resolved())
                .cloned()
                .unwrap_or(Reference::Unresolved(identifier.clone()));
            collection
                .elements
                .insert(identifier.id().to_string(), reference);
        }
        collection
    }

    /// Returns the type every member must have.
    #[must_use]
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Adds a loaded resource, replacing any member with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResourceType`] when the resource's type
    /// differs from the declared type, and [`ResourceError::InvalidData`]
    /// when it has not been saved yet (members are keyed by id).
    pub fn add(&mut self, resource: ResourceHandle) -> Result<(), ResourceError> {
        let identifier = resource.identifier();
        self.check(&identifier)?;
        self.elements
            .insert(identifier.id().to_string(), Reference::Resolved(resource));
        Ok(())
    }

    /// Adds a member by identifier, leaving it unresolved.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceCollection::add`].
    pub fn add_identifier(&mut self, identifier: ResourceIdentifier) -> Result<(), ResourceError> {
        self.check(&identifier)?;
        self.elements.insert(
            identifier.id().to_string(),
            Reference::Unresolved(identifier),
        );
        Ok(())
    }

    fn check(&self, identifier: &ResourceIdentifier) -> Result<(), ResourceError> {
        if identifier.type_name() != self.declared_type {
            return Err(ResourceError::invalid_type(
                &self.declared_type,
                identifier.type_name(),
            ));
        }
        if !identifier.is_saved() {
            return Err(ResourceError::invalid_data(
                "Unable to add a resource without an id to a collection.",
                &identifier.linkage(),
            ));
        }
        Ok(())
    }

    /// Removes the member with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> bool {
        self.elements.shift_remove(id).is_some()
    }

    /// Returns member ids in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.elements.keys().cloned().collect()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` when there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns `true` when a member with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Returns the member reference for `id` without resolving it.
    #[must_use]
    pub fn reference(&self, id: &str) -> Option<&Reference> {
        self.elements.get(id)
    }

    /// Iterates over member references in order without resolving them.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.elements.values()
    }

    /// Returns the loaded members, in order, skipping unresolved ones.
    #[must_use]
    pub fn resolved(&self) -> Vec<ResourceHandle> {
        self.elements
            .values()
            .filter_map(Reference::handle)
            .cloned()
            .collect()
    }

    /// Returns the top-level `meta` of the document this collection came from.
    #[must_use]
    pub const fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    pub(crate) fn set_meta(&mut self, meta: Option<Value>) {
        self.meta = meta;
    }

    /// Returns the member with `id`, loading it on first access.
    ///
    /// Returns `None` when there is no such member or the server no longer
    /// has it; in the latter case the member stays unresolved.
    ///
    /// Use this on collections you own, such as the result of
    /// [`ResourceStore::find_all`]. A collection held by a resource is
    /// resolved through [`ResourceHandle::related_member`] instead, which
    /// does not keep the resource borrowed while the request runs.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ResourceStore::find`] other than a `404`.
    pub async fn get<T: Transport>(
        &mut self,
        id: &str,
        store: &ResourceStore<T>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        let identifier = match self.elements.get(id) {
            None => return Ok(None),
            Some(Reference::Resolved(handle)) => return Ok(Some(handle.clone())),
            Some(Reference::Unresolved(identifier)) => identifier.clone(),
        };

        let resolved = store.find(identifier.type_name(), identifier.id(), None).await?;
        if let Some(handle) = &resolved {
            self.resolve_with(&identifier, handle.clone());
        }
        Ok(resolved)
    }

    /// Returns every member in order, loading unresolved ones.
    ///
    /// Members the server no longer has are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`ResourceStore::find`] other than a
    /// `404`.
    pub async fn resources<T: Transport>(
        &mut self,
        store: &ResourceStore<T>,
    ) -> Result<Vec<ResourceHandle>, ResourceError> {
        let mut resources = Vec::with_capacity(self.elements.len());
        for id in self.keys() {
            match self.get(&id, store).await? {
                Some(handle) => resources.push(handle),
                None => {
                    tracing::warn!(
                        "Skipping {}/{}: not found on the server",
                        self.declared_type,
                        id
                    );
                }
            }
        }
        Ok(resources)
    }

    /// Swaps an unresolved member for its loaded resource.
    pub(crate) fn resolve_with(&mut self, identifier: &ResourceIdentifier, handle: ResourceHandle) {
        if let Some(reference) = self.elements.get_mut(identifier.id()) {
            if matches!(reference, Reference::Unresolved(current) if current == identifier) {
                *reference = Reference::Resolved(handle);
            }
        }
    }

    /// Encodes the members as `{"data": [linkage, ...]}`.
    #[must_use]
    pub fn encode_identifier(&self) -> Value {
        let data: Vec<Value> = self
            .elements
            .values()
            .map(|reference| reference.identifier().linkage())
            .collect();
        json!({ "data": data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, ResourceSchema};
    use std::sync::Arc;

    fn handle(type_name: &str, id: &str) -> ResourceHandle {
        let mut resource = Resource::new(Arc::new(ResourceSchema::builder(type_name).build()));
        resource.set_id(id);
        ResourceHandle::new(resource)
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut collection = ResourceCollection::new("part");
        collection.add(handle("part", "9")).unwrap();
        collection
            .add_identifier(ResourceIdentifier::new("part", "3"))
            .unwrap();
        collection.add(handle("part", "5")).unwrap();

        assert_eq!(collection.keys(), vec!["9", "3", "5"]);
        assert_eq!(collection.len(), 3);
        assert!(collection.contains("3"));
        assert!(!collection.contains("4"));
    }

    #[test]
    fn test_add_rejects_wrong_type() {
        let mut collection = ResourceCollection::new("part");
        let result = collection.add(handle("tag", "1"));

        assert!(matches!(result, Err(ResourceError::InvalidResourceType { .. })));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_add_rejects_unsaved_member() {
        let mut collection = ResourceCollection::new("part");
        let result = collection.add(handle("part", ""));

        assert!(matches!(result, Err(ResourceError::InvalidData { .. })));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut collection = ResourceCollection::new("part");
        for id in ["1", "2", "3"] {
            collection
                .add_identifier(ResourceIdentifier::new("part", id))
                .unwrap();
        }

        assert!(collection.remove("2"));
        assert_eq!(collection.keys(), vec!["1", "3"]);
    }

    #[test]
    fn test_from_decoded_reuses_loaded_members() {
        let loaded = handle("part", "1");
        let mut previous = ResourceCollection::new("part");
        previous.add(loaded.clone()).unwrap();

        let collection = ResourceCollection::from_decoded(
            "part".to_string(),
            vec![
                ResourceIdentifier::new("part", "1"),
                ResourceIdentifier::new("part", "2"),
            ],
            Some(&previous),
        );

        assert!(collection.reference("1").unwrap().handle().unwrap().ptr_eq(&loaded));
        assert!(!collection.reference("2").unwrap().is_resolved());
        assert_eq!(collection.resolved().len(), 1);
    }

    #[test]
    fn test_encode_identifier() {
        let mut collection = ResourceCollection::new("part");
        collection
            .add_identifier(ResourceIdentifier::new("part", "1"))
            .unwrap();

        assert_eq!(
            collection.encode_identifier(),
            json!({"data": [{"id": "1", "type": "part"}]})
        );
    }
}
