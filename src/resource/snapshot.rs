//! Serializable snapshots of a resource's state.
//!
//! A [`ResourceSnapshot`] holds the id, attributes and relationship
//! identifiers of a [`Resource`] and can be written anywhere `serde` can
//! write. Restoring a snapshot gives back a resource with the same content;
//! related resources come back as unresolved identifiers.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{
    Reference, Resource, ResourceCollection, ResourceError, ResourceIdentifier, ResourceSchema,
};

/// The persisted form of a [`Resource`].
///
/// Date attributes are stored as ISO-8601 strings. A to-many entry of `None`
/// means the relationship was never populated, which is different from an
/// empty list.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use jsonapi_store::{AttributeType, Resource, ResourceSchema};
/// use jsonapi_store::resource::ResourceSnapshot;
///
/// let schema = Arc::new(
///     ResourceSchema::builder("tag")
///         .attribute("label", AttributeType::String)
///         .build(),
/// );
/// let mut tag = Resource::new(schema.clone());
/// tag.set_attribute("label", "sale").unwrap();
///
/// let json = serde_json::to_string(&tag.snapshot()).unwrap();
/// let snapshot: ResourceSnapshot = serde_json::from_str(&json).unwrap();
/// let restored = Resource::restore(schema, &snapshot).unwrap();
///
/// assert_eq!(restored.attribute("label").unwrap().as_str(), Some("sale"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// The resource type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The id, empty for a resource that was never saved.
    #[serde(default)]
    pub id: String,
    /// Attribute values as JSON.
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
    /// To-one relationship targets.
    #[serde(default)]
    pub to_one: IndexMap<String, Option<ResourceIdentifier>>,
    /// To-many relationship members, in order.
    #[serde(default)]
    pub to_many: IndexMap<String, Option<Vec<ResourceIdentifier>>>,
}

impl Resource {
    /// Captures this resource's id, attributes and relationship identifiers.
    #[must_use]
    pub fn snapshot(&self) -> ResourceSnapshot {
        let attributes = self
            .attributes()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();

        let to_one = self
            .schema()
            .to_one_relationships()
            .filter_map(|(name, _)| {
                let relationship = self.to_one(name).ok()?;
                Some((name.to_string(), relationship.identifier()))
            })
            .collect();

        let to_many = self
            .schema()
            .to_many_relationships()
            .filter_map(|(name, _)| {
                let relationship = self.to_many(name).ok()?;
                let members = relationship.collection().map(|collection| {
                    collection
                        .references()
                        .map(Reference::identifier)
                        .collect::<Vec<_>>()
                });
                Some((name.to_string(), members))
            })
            .collect();

        ResourceSnapshot {
            type_name: self.type_name().to_string(),
            id: self.id().to_string(),
            attributes,
            to_one,
            to_many,
        }
    }

    /// Rebuilds a resource of `schema` from `snapshot`.
    ///
    /// Names the schema does not declare are skipped. The restored resource
    /// is clean unless it was never saved.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidResourceType`] when the snapshot's type, or
    ///   the type of a related identifier, does not match the schema
    /// - [`ResourceError::InvalidData`] for unparseable dates or unsaved
    ///   to-many members
    pub fn restore(
        schema: Arc<ResourceSchema>,
        snapshot: &ResourceSnapshot,
    ) -> Result<Self, ResourceError> {
        if snapshot.type_name != schema.type_name() {
            return Err(ResourceError::invalid_type(
                schema.type_name(),
                &snapshot.type_name,
            ));
        }

        let mut resource = Self::new(schema);
        resource.set_id(&snapshot.id);

        for (name, value) in &snapshot.attributes {
            if resource.schema().attribute(name).is_none() {
                tracing::debug!("Skipping undeclared attribute {:?} in snapshot", name);
                continue;
            }
            resource.set_attribute(name, value.clone())?;
        }

        for (name, identifier) in &snapshot.to_one {
            if resource.schema().to_one(name).is_none() {
                tracing::debug!("Skipping undeclared relationship {:?} in snapshot", name);
                continue;
            }
            resource
                .to_one_mut(name)?
                .set_identifier(identifier.clone())?;
        }

        for (name, members) in &snapshot.to_many {
            let Some(decl) = resource.schema().to_many(name) else {
                tracing::debug!("Skipping undeclared relationship {:?} in snapshot", name);
                continue;
            };
            let collection = match members {
                Some(members) => {
                    let mut collection = ResourceCollection::new(decl.target_type());
                    for identifier in members {
                        collection.add_identifier(identifier.clone())?;
                    }
                    Some(collection)
                }
                None => None,
            };
            resource.set_to_many(name, collection)?;
        }

        resource.mark_clean();
        Ok(resource)
    }
}
