//! The resource entity: attributes, relationships and dirty tracking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::resource::identifier::validate_data;
use crate::resource::{
    AttributeValue, ResourceCollection, ResourceError, ResourceHandle, ResourceIdentifier,
    ResourceSchema, ToManyRelationship, ToOneRelationship,
};

/// Options for [`Resource::encode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Send every to-many relationship in full, replacing server membership.
    pub to_many_replace: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            to_many_replace: true,
        }
    }
}

/// A JSON:API resource.
///
/// The set of attributes and relationships is fixed by the resource's
/// [`ResourceSchema`]. Reading or writing a name the schema does not declare
/// fails with [`ResourceError::InvalidProperty`].
///
/// Resources are usually shared through a [`ResourceHandle`] handed out by
/// a [`ResourceStore`](crate::ResourceStore).
///
/// # Example
///
/// ```rust
/// use jsonapi_store::{AttributeType, EncodeOptions, Resource, ResourceSchema};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let schema = ResourceSchema::builder("widget")
///     .attribute("title", AttributeType::String)
///     .build();
///
/// let mut widget = Resource::new(Arc::new(schema));
/// widget.set_attribute("title", "Sprocket").unwrap();
///
/// assert_eq!(
///     widget.encode(&EncodeOptions::default()),
///     json!({"data": {
///         "type": "widget",
///         "attributes": {"title": "Sprocket"},
///         "relationships": {}
///     }})
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Resource {
    identifier: ResourceIdentifier,
    schema: Arc<ResourceSchema>,
    attributes: IndexMap<String, AttributeValue>,
    to_one: IndexMap<String, ToOneRelationship>,
    to_many: IndexMap<String, ToManyRelationship>,
    fetched_date: Option<DateTime<Utc>>,
    modified: bool,
}

enum DecodedRelationship {
    ToOne(String, Option<ResourceIdentifier>),
    ToMany(String, Vec<ResourceIdentifier>),
}

impl Resource {
    /// Creates an unsaved resource with the schema's defaults.
    #[must_use]
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        let attributes = schema
            .attributes()
            .map(|(name, decl)| (name.to_string(), decl.default_value().clone()))
            .collect();

        let to_one = schema
            .to_one_relationships()
            .map(|(name, decl)| {
                let mut relationship = ToOneRelationship::new(decl.target_type());
                relationship.set_auto_save(decl.auto_save());
                (name.to_string(), relationship)
            })
            .collect();

        let to_many = schema
            .to_many_relationships()
            .map(|(name, decl)| {
                let mut relationship = ToManyRelationship::new(decl.target_type());
                relationship.set_auto_save(decl.auto_save());
                (name.to_string(), relationship)
            })
            .collect();

        Self {
            identifier: ResourceIdentifier::new(schema.type_name(), ""),
            schema,
            attributes,
            to_one,
            to_many,
            fetched_date: None,
            modified: false,
        }
    }

    /// Returns the schema this resource was built from.
    #[must_use]
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Returns the `(type, id)` identifier.
    #[must_use]
    pub const fn identifier(&self) -> &ResourceIdentifier {
        &self.identifier
    }

    /// Returns the resource type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.identifier.type_name()
    }

    /// Returns the id (empty until saved).
    #[must_use]
    pub fn id(&self) -> &str {
        self.identifier.id()
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.identifier.set_id(id);
    }

    /// Returns `true` once the server has assigned an id.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.identifier.is_saved()
    }

    /// Returns when this resource was last loaded from the server.
    ///
    /// Taken from the response's `meta.timeStamp` when the server sends one.
    #[must_use]
    pub const fn fetched_date(&self) -> Option<DateTime<Utc>> {
        self.fetched_date
    }

    pub(crate) fn set_fetched_date(&mut self, fetched_date: Option<DateTime<Utc>>) {
        self.fetched_date = fetched_date;
    }

    // Attributes

    /// Returns the value of attribute `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn attribute(&self, name: &str) -> Result<&AttributeValue, ResourceError> {
        self.attributes
            .get(name)
            .ok_or_else(|| ResourceError::invalid_property(name, self.type_name()))
    }

    /// Sets attribute `name`, marking the resource modified.
    ///
    /// Strings assigned to date attributes are parsed into timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names and
    /// [`ResourceError::InvalidData`] for unparseable dates.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ResourceError> {
        let value = self.coerce_attribute(name, value.into())?;
        self.attributes.insert(name.to_string(), value);
        self.modified = true;
        Ok(())
    }

    fn coerce_attribute(
        &self,
        name: &str,
        value: AttributeValue,
    ) -> Result<AttributeValue, ResourceError> {
        let decl = self
            .schema
            .attribute(name)
            .ok_or_else(|| ResourceError::invalid_property(name, self.type_name()))?;
        value.coerce(decl.attribute_type())
    }

    /// Iterates over attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    // Relationships

    /// Returns to-one relationship `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn to_one(&self, name: &str) -> Result<&ToOneRelationship, ResourceError> {
        self.to_one
            .get(name)
            .ok_or_else(|| ResourceError::invalid_property(name, self.identifier.type_name()))
    }

    /// Returns to-one relationship `name` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn to_one_mut(&mut self, name: &str) -> Result<&mut ToOneRelationship, ResourceError> {
        let type_name = self.identifier.type_name();
        self.to_one
            .get_mut(name)
            .ok_or_else(|| ResourceError::invalid_property(name, type_name))
    }

    /// Points to-one relationship `name` at `target` (or clears it).
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names and
    /// [`ResourceError::InvalidResourceType`] when `target` has the wrong type.
    pub fn set_to_one(
        &mut self,
        name: &str,
        target: Option<ResourceHandle>,
    ) -> Result<(), ResourceError> {
        self.to_one_mut(name)?.set(target)
    }

    /// Returns to-many relationship `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn to_many(&self, name: &str) -> Result<&ToManyRelationship, ResourceError> {
        self.to_many
            .get(name)
            .ok_or_else(|| ResourceError::invalid_property(name, self.identifier.type_name()))
    }

    /// Returns to-many relationship `name` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names.
    pub fn to_many_mut(&mut self, name: &str) -> Result<&mut ToManyRelationship, ResourceError> {
        let type_name = self.identifier.type_name();
        self.to_many
            .get_mut(name)
            .ok_or_else(|| ResourceError::invalid_property(name, type_name))
    }

    /// Replaces the collection behind to-many relationship `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] for undeclared names and
    /// [`ResourceError::InvalidResourceType`] for a foreign collection.
    pub fn set_to_many(
        &mut self,
        name: &str,
        collection: Option<ResourceCollection>,
    ) -> Result<(), ResourceError> {
        self.to_many_mut(name)?.set(collection)
    }

    /// Sets whether relationship `name` is saved along with this resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidProperty`] when no relationship is
    /// declared under `name`.
    pub fn set_auto_save(&mut self, name: &str, auto_save: bool) -> Result<(), ResourceError> {
        if let Some(relationship) = self.to_one.get_mut(name) {
            relationship.set_auto_save(auto_save);
            return Ok(());
        }
        self.to_many_mut(name)?.set_auto_save(auto_save);
        Ok(())
    }

    /// Returns the loaded targets of every auto-saved relationship.
    pub(crate) fn auto_save_targets(&self) -> Vec<ResourceHandle> {
        let to_one = self
            .to_one
            .values()
            .filter(|relationship| relationship.auto_save())
            .filter_map(|relationship| relationship.resolved().cloned());

        let to_many = self
            .to_many
            .values()
            .filter(|relationship| relationship.auto_save())
            .filter_map(ToManyRelationship::collection)
            .flat_map(ResourceCollection::resolved);

        to_one.chain(to_many).collect()
    }

    // Dirty tracking

    /// Returns `true` when the resource has unsaved changes or was never saved.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
            || !self.is_saved()
            || self.to_one.values().any(ToOneRelationship::is_modified_locally)
            || self.to_many.values().any(ToManyRelationship::is_modified_locally)
    }

    /// Clears every modification flag.
    pub fn mark_clean(&mut self) {
        self.modified = false;
        self.to_one.values_mut().for_each(ToOneRelationship::mark_clean);
        self.to_many.values_mut().for_each(ToManyRelationship::mark_clean);
    }

    // Encode / decode

    /// Populates this resource from a JSON:API resource object.
    ///
    /// Unknown attributes and relationships are ignored, as are relationship
    /// entries without `data` and entries whose shape does not match the
    /// declaration. Nothing is changed unless the whole object is accepted.
    /// Afterwards the resource is clean.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidData`] when `type` or `id` is missing or not
    ///   a string, or a date attribute cannot be parsed
    /// - [`ResourceError::InvalidResourceType`] when `type` is not this
    ///   resource's type, or a related identifier has the wrong type
    pub fn decode(&mut self, data: &Value) -> Result<(), ResourceError> {
        let (type_name, id) = validate_data(data)?;
        if type_name != self.type_name() {
            return Err(ResourceError::invalid_type(self.type_name(), type_name));
        }

        let attributes = self.decode_attributes(data)?;
        let relationships = self.decode_relationships(data)?;

        self.identifier.set_id(id);
        for (name, value) in attributes {
            self.attributes.insert(name, value);
        }
        for relationship in relationships {
            match relationship {
                DecodedRelationship::ToOne(name, identifier) => {
                    if let Some(to_one) = self.to_one.get_mut(&name) {
                        to_one.replace_decoded(identifier);
                    }
                }
                DecodedRelationship::ToMany(name, identifiers) => {
                    if let Some(to_many) = self.to_many.get_mut(&name) {
                        to_many.replace_decoded(identifiers);
                    }
                }
            }
        }

        self.mark_clean();
        Ok(())
    }

    fn decode_attributes(
        &self,
        data: &Value,
    ) -> Result<Vec<(String, AttributeValue)>, ResourceError> {
        let Some(attributes) = data.get("attributes").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        attributes
            .iter()
            .filter(|(name, _)| self.schema.attribute(name).is_some())
            .map(|(name, value)| {
                let value = self.coerce_attribute(name, AttributeValue::Json(value.clone()))?;
                Ok((name.clone(), value))
            })
            .collect()
    }

    fn decode_relationships(
        &self,
        data: &Value,
    ) -> Result<Vec<DecodedRelationship>, ResourceError> {
        let Some(relationships) = data.get("relationships").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut decoded = Vec::new();
        for (name, entry) in relationships {
            let Some(linkage) = entry.get("data") else {
                continue;
            };

            match (linkage, self.to_one.get(name), self.to_many.get(name)) {
                (Value::Null, Some(_), _) => {
                    decoded.push(DecodedRelationship::ToOne(name.clone(), None));
                }
                (Value::Object(_), Some(to_one), _) => {
                    let identifier = ResourceIdentifier::decode(linkage)?;
                    to_one.check_decoded(&identifier)?;
                    decoded.push(DecodedRelationship::ToOne(name.clone(), Some(identifier)));
                }
                (Value::Array(items), _, Some(to_many)) => {
                    let identifiers = items
                        .iter()
                        .map(|item| {
                            let identifier = ResourceIdentifier::decode(item)?;
                            to_many.check_decoded(&identifier)?;
                            Ok(identifier)
                        })
                        .collect::<Result<Vec<_>, ResourceError>>()?;
                    decoded.push(DecodedRelationship::ToMany(name.clone(), identifiers));
                }
                _ => {
                    tracing::debug!(
                        "Ignoring relationship {:?} on {}",
                        name,
                        self.type_name()
                    );
                }
            }
        }
        Ok(decoded)
    }

    /// Encodes this resource as a JSON:API document.
    ///
    /// Attributes are always sent in full. A to-one relationship is sent only
    /// when it was reassigned; to-many relationships are sent in full only
    /// when [`EncodeOptions::to_many_replace`] is set.
    #[must_use]
    pub fn encode(&self, options: &EncodeOptions) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        let mut relationships = Map::new();
        for (name, relationship) in &self.to_one {
            if relationship.is_modified_locally() {
                relationships.insert(name.clone(), relationship.encode_identifier());
            }
        }
        if options.to_many_replace {
            for (name, relationship) in &self.to_many {
                relationships.insert(name.clone(), relationship.encode_identifier());
            }
        }

        let mut data = Map::new();
        if self.is_saved() {
            data.insert("id".to_string(), Value::String(self.id().to_string()));
        }
        data.insert(
            "type".to_string(),
            Value::String(self.type_name().to_string()),
        );
        data.insert("attributes".to_string(), Value::Object(attributes));
        data.insert("relationships".to_string(), Value::Object(relationships));

        let mut document = Map::new();
        document.insert("data".to_string(), Value::Object(data));
        Value::Object(document)
    }

    /// Encodes this resource's identifier as `{"data": {"id", "type"}}`.
    #[must_use]
    pub fn encode_identifier(&self) -> Value {
        self.identifier.encode_identifier()
    }
}
