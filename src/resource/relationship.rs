//! To-one and to-many relationship containers.
//!
//! Both containers enforce that every related resource has the declared
//! type, and both track whether the relationship was changed locally so
//! that [`Resource::encode`](crate::Resource::encode) knows what to send.
//! Decoding never fetches anything: related resources arrive as bare
//! identifiers and are resolved on first access through
//! [`ResourceHandle::related`] and [`ResourceHandle::related_member`].

use serde_json::{json, Value};

use crate::resource::{ResourceCollection, ResourceError, ResourceHandle, ResourceIdentifier};

/// A related resource that may not have been loaded yet.
#[derive(Clone, Debug)]
pub enum Reference {
    /// Only the identifier is known.
    Unresolved(ResourceIdentifier),
    /// The resource has been loaded (or was assigned directly).
    Resolved(ResourceHandle),
}

impl Reference {
    /// Returns the identifier of the referenced resource.
    #[must_use]
    pub fn identifier(&self) -> ResourceIdentifier {
        match self {
            Self::Unresolved(identifier) => identifier.clone(),
            Self::Resolved(handle) => handle.identifier(),
        }
    }

    /// Returns the handle, if resolved.
    #[must_use]
    pub const fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::Resolved(handle) => Some(handle),
            Self::Unresolved(_) => None,
        }
    }

    /// Returns `true` once the resource has been loaded.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns `true` when both refer to the same resource.
    ///
    /// Saved resources are compared by type and id. Unsaved resources have no
    /// id yet, so they are only the same when they are the same object.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        if let (Self::Resolved(a), Self::Resolved(b)) = (self, other) {
            if a.ptr_eq(b) {
                return true;
            }
        }

        let a = self.identifier();
        let b = other.identifier();
        a.is_saved() && b.is_saved() && a == b
    }
}

fn same_target(a: Option<&Reference>, b: Option<&Reference>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_identity(b),
        _ => false,
    }
}

/// A relationship to at most one resource.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::{Resource, ResourceHandle, ResourceSchema, ToOneRelationship};
/// use std::sync::Arc;
///
/// let tag = ResourceHandle::new(Resource::new(Arc::new(ResourceSchema::builder("tag").build())));
/// let mut relationship = ToOneRelationship::new("tag");
///
/// relationship.set(Some(tag)).unwrap();
/// assert!(relationship.is_modified_locally());
/// ```
#[derive(Clone, Debug)]
pub struct ToOneRelationship {
    declared_type: String,
    target: Option<Reference>,
    modified_locally: bool,
    auto_save: bool,
}

impl ToOneRelationship {
    /// Creates an empty relationship to resources of `declared_type`.
    #[must_use]
    pub fn new(declared_type: impl Into<String>) -> Self {
        Self {
            declared_type: declared_type.into(),
            target: None,
            modified_locally: false,
            auto_save: false,
        }
    }

    /// Returns the type every target must have.
    #[must_use]
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Returns the current target without resolving it.
    #[must_use]
    pub const fn reference(&self) -> Option<&Reference> {
        self.target.as_ref()
    }

    /// Returns the identifier of the current target.
    #[must_use]
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.target.as_ref().map(Reference::identifier)
    }

    /// Assigns a new target (or clears it with `None`).
    ///
    /// The relationship is only marked modified when the target's identity
    /// actually changes.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResourceType`] when the target's type
    /// differs from the declared type. Nothing is changed in that case.
    pub fn set(&mut self, target: Option<ResourceHandle>) -> Result<(), ResourceError> {
        self.assign(target.map(Reference::Resolved))
    }

    /// Assigns a target by identifier, leaving it unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResourceType`] on a type mismatch.
    pub fn set_identifier(
        &mut self,
        identifier: Option<ResourceIdentifier>,
    ) -> Result<(), ResourceError> {
        self.assign(identifier.map(Reference::Unresolved))
    }

    fn assign(&mut self, target: Option<Reference>) -> Result<(), ResourceError> {
        if let Some(reference) = &target {
            self.check_type(&reference.identifier())?;
        }

        if !same_target(self.target.as_ref(), target.as_ref()) {
            self.modified_locally = true;
        }
        self.target = target;
        Ok(())
    }

    fn check_type(&self, identifier: &ResourceIdentifier) -> Result<(), ResourceError> {
        if identifier.type_name() == self.declared_type {
            Ok(())
        } else {
            Err(ResourceError::invalid_type(
                &self.declared_type,
                identifier.type_name(),
            ))
        }
    }

    /// Swaps an unresolved target for its loaded resource.
    pub(crate) fn resolve_with(&mut self, identifier: &ResourceIdentifier, handle: ResourceHandle) {
        if let Some(Reference::Unresolved(current)) = &self.target {
            if current == identifier {
                self.target = Some(Reference::Resolved(handle));
            }
        }
    }

    /// Replaces the target from a decoded document without marking it modified.
    ///
    /// A resolved target with the same identity is kept.
    pub(crate) fn replace_decoded(&mut self, identifier: Option<ResourceIdentifier>) {
        let incoming = identifier.map(Reference::Unresolved);
        if !same_target(self.target.as_ref(), incoming.as_ref()) {
            self.target = incoming;
        }
    }

    pub(crate) fn check_decoded(&self, identifier: &ResourceIdentifier) -> Result<(), ResourceError> {
        self.check_type(identifier)
    }

    /// Returns the loaded target, if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&ResourceHandle> {
        self.target.as_ref().and_then(Reference::handle)
    }

    /// Returns `true` when the target was reassigned since the last save.
    #[must_use]
    pub const fn is_modified_locally(&self) -> bool {
        self.modified_locally
    }

    /// Clears the local modification flag.
    pub fn mark_clean(&mut self) {
        self.modified_locally = false;
    }

    /// Returns `true` when the target is saved along with its owner.
    #[must_use]
    pub const fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Sets whether the target is saved along with its owner.
    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    /// Encodes the relationship as `{"data": linkage}` or `{"data": null}`.
    #[must_use]
    pub fn encode_identifier(&self) -> Value {
        self.identifier().map_or_else(
            || json!({ "data": Value::Null }),
            |identifier| identifier.encode_identifier(),
        )
    }
}

/// A relationship to a collection of resources.
#[derive(Clone, Debug)]
pub struct ToManyRelationship {
    declared_type: String,
    collection: Option<ResourceCollection>,
    modified_locally: bool,
    auto_save: bool,
}

impl ToManyRelationship {
    /// Creates an empty relationship to resources of `declared_type`.
    #[must_use]
    pub fn new(declared_type: impl Into<String>) -> Self {
        Self {
            declared_type: declared_type.into(),
            collection: None,
            modified_locally: false,
            auto_save: false,
        }
    }

    /// Returns the type every member must have.
    #[must_use]
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Returns the collection without resolving anything.
    #[must_use]
    pub const fn collection(&self) -> Option<&ResourceCollection> {
        self.collection.as_ref()
    }

    /// Returns the collection for resolving members.
    ///
    /// Membership changes made through the returned collection are not
    /// tracked; use [`ToManyRelationship::add`] and
    /// [`ToManyRelationship::remove`] for that.
    pub fn collection_mut(&mut self) -> Option<&mut ResourceCollection> {
        self.collection.as_mut()
    }

    /// Replaces the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResourceType`] when the collection's
    /// element type differs from the declared type.
    pub fn set(&mut self, collection: Option<ResourceCollection>) -> Result<(), ResourceError> {
        if let Some(collection) = &collection {
            if collection.declared_type() != self.declared_type {
                return Err(ResourceError::invalid_type(
                    &self.declared_type,
                    collection.declared_type(),
                ));
            }
        }
        self.collection = collection;
        self.modified_locally = true;
        Ok(())
    }

    /// Adds a member.
    ///
    /// # Errors
    ///
    /// See [`ResourceCollection::add`].
    pub fn add(&mut self, resource: ResourceHandle) -> Result<(), ResourceError> {
        let declared_type = self.declared_type.clone();
        self.collection
            .get_or_insert_with(|| ResourceCollection::new(declared_type))
            .add(resource)?;
        self.modified_locally = true;
        Ok(())
    }

    /// Removes the member with `id`, returning whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self
            .collection
            .as_mut()
            .is_some_and(|collection| collection.remove(id));
        if removed {
            self.modified_locally = true;
        }
        removed
    }

    /// Returns member ids in order without resolving anything.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.collection
            .as_ref()
            .map(ResourceCollection::keys)
            .unwrap_or_default()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.as_ref().map_or(0, ResourceCollection::len)
    }

    /// Returns `true` when there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces members from a decoded document without marking it modified.
    pub(crate) fn replace_decoded(&mut self, identifiers: Vec<ResourceIdentifier>) {
        let previous = self.collection.take();
        self.collection = Some(ResourceCollection::from_decoded(
            self.declared_type.clone(),
            identifiers,
            previous.as_ref(),
        ));
    }

    pub(crate) fn check_decoded(&self, identifier: &ResourceIdentifier) -> Result<(), ResourceError> {
        if identifier.type_name() == self.declared_type {
            Ok(())
        } else {
            Err(ResourceError::invalid_type(
                &self.declared_type,
                identifier.type_name(),
            ))
        }
    }

    /// Returns `true` when membership changed since the last save.
    #[must_use]
    pub const fn is_modified_locally(&self) -> bool {
        self.modified_locally
    }

    /// Clears the local modification flag.
    pub fn mark_clean(&mut self) {
        self.modified_locally = false;
    }

    /// Returns `true` when members are saved along with their owner.
    #[must_use]
    pub const fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Sets whether members are saved along with their owner.
    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    /// Encodes the relationship as `{"data": [linkage, ...]}`.
    #[must_use]
    pub fn encode_identifier(&self) -> Value {
        self.collection.as_ref().map_or_else(
            || json!({ "data": [] }),
            ResourceCollection::encode_identifier,
        )
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
    fn test_set_marks_modified() {
        let mut relationship = ToOneRelationship::new("tag");
        relationship.set(Some(handle("tag", "1"))).unwrap();

        assert!(relationship.is_modified_locally());
        assert_eq!(relationship.identifier(), Some(ResourceIdentifier::new("tag", "1")));
    }

    #[test]
    fn test_set_wrong_type_changes_nothing() {
        let mut relationship = ToOneRelationship::new("tag");
        let result = relationship.set(Some(handle("user", "1")));

        assert!(matches!(
            result,
            Err(ResourceError::InvalidResourceType { ref expected, ref actual })
                if expected == "tag" && actual == "user"
        ));
        assert!(relationship.reference().is_none());
        assert!(!relationship.is_modified_locally());
    }

    #[test]
    fn test_same_identity_is_not_a_modification() {
        let mut relationship = ToOneRelationship::new("tag");
        relationship.replace_decoded(Some(ResourceIdentifier::new("tag", "1")));
        assert!(!relationship.is_modified_locally());

        relationship.set(Some(handle("tag", "1"))).unwrap();
        assert!(!relationship.is_modified_locally());

        relationship.set(Some(handle("tag", "2"))).unwrap();
        assert!(relationship.is_modified_locally());
    }

    #[test]
    fn test_clearing_is_a_modification() {
        let mut relationship = ToOneRelationship::new("tag");
        relationship.replace_decoded(Some(ResourceIdentifier::new("tag", "1")));

        relationship.set(None).unwrap();
        assert!(relationship.is_modified_locally());
        assert_eq!(relationship.encode_identifier(), json!({"data": null}));
    }

    #[test]
    fn test_unsaved_targets_compare_by_object() {
        let mut relationship = ToOneRelationship::new("tag");
        let first = handle("tag", "");
        let second = handle("tag", "");

        relationship.set(Some(first.clone())).unwrap();
        relationship.mark_clean();

        relationship.set(Some(first)).unwrap();
        assert!(!relationship.is_modified_locally());

        relationship.set(Some(second)).unwrap();
        assert!(relationship.is_modified_locally());
    }

    #[test]
    fn test_replace_decoded_keeps_resolved_target() {
        let mut relationship = ToOneRelationship::new("tag");
        let target = handle("tag", "1");
        relationship.set(Some(target.clone())).unwrap();

        relationship.replace_decoded(Some(ResourceIdentifier::new("tag", "1")));
        assert!(relationship.resolved().unwrap().ptr_eq(&target));
    }

    #[test]
    fn test_to_many_add_and_remove() {
        let mut relationship = ToManyRelationship::new("part");
        assert_eq!(relationship.encode_identifier(), json!({"data": []}));

        relationship.add(handle("part", "4")).unwrap();
        relationship.add(handle("part", "5")).unwrap();
        assert!(relationship.is_modified_locally());
        assert_eq!(relationship.keys(), vec!["4", "5"]);

        relationship.mark_clean();
        assert!(!relationship.remove("9"));
        assert!(!relationship.is_modified_locally());
        assert!(relationship.remove("4"));
        assert!(relationship.is_modified_locally());
        assert_eq!(
            relationship.encode_identifier(),
            json!({"data": [{"id": "5", "type": "part"}]})
        );
    }

    #[test]
    fn test_to_many_rejects_foreign_collection() {
        let mut relationship = ToManyRelationship::new("part");
        let result = relationship.set(Some(ResourceCollection::new("tag")));

        assert!(matches!(result, Err(ResourceError::InvalidResourceType { .. })));
        assert!(relationship.collection().is_none());
    }
}
