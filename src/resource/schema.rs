//! Per-type resource declarations.
//!
//! A [`ResourceSchema`] fixes, for one JSON:API type, which attributes a
//! resource carries (with their types and defaults) and which to-one and
//! to-many relationships it declares. Schemas are registered with a
//! [`ResourceStore`](crate::ResourceStore) so that decoded documents can be
//! turned into resources of the right shape.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_store::{AttributeType, ResourceClass, ResourceSchemaBuilder};
//!
//! struct Widget;
//!
//! impl ResourceClass for Widget {
//!     const TYPE: &'static str = "widget";
//!
//!     fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
//!         schema
//!             .attribute("title", AttributeType::String)
//!             .attribute("released", AttributeType::Date)
//!             .auto_saved_to_one("tag", "tag")
//!             .to_many("parts", "part")
//!     }
//! }
//!
//! let schema = Widget::schema();
//! assert_eq!(schema.type_name(), "widget");
//! assert!(schema.to_one("tag").unwrap().auto_save());
//! ```

use indexmap::IndexMap;

use crate::resource::{AttributeType, AttributeValue};

/// Declaration of a single attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDecl {
    attribute_type: AttributeType,
    default: AttributeValue,
}

impl AttributeDecl {
    /// Returns the declared attribute type.
    #[must_use]
    pub const fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    /// Returns the value a new resource starts with.
    #[must_use]
    pub const fn default_value(&self) -> &AttributeValue {
        &self.default
    }
}

/// Declaration of a to-one or to-many relationship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipDecl {
    target_type: String,
    auto_save: bool,
}

impl RelationshipDecl {
    /// Returns the type every related resource must have.
    #[must_use]
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Returns `true` when related resources are saved before the owner.
    #[must_use]
    pub const fn auto_save(&self) -> bool {
        self.auto_save
    }
}

/// The declared shape of one resource type.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSchema {
    type_name: String,
    attributes: IndexMap<String, AttributeDecl>,
    to_one: IndexMap<String, RelationshipDecl>,
    to_many: IndexMap<String, RelationshipDecl>,
}

impl ResourceSchema {
    /// Starts declaring a schema for `type_name`.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> ResourceSchemaBuilder {
        ResourceSchemaBuilder::new(type_name)
    }

    /// Returns the JSON:API type this schema describes.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the attribute declaration for `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.get(name)
    }

    /// Iterates over attribute declarations in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeDecl)> {
        self.attributes.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    /// Returns the to-one declaration for `name`.
    #[must_use]
    pub fn to_one(&self, name: &str) -> Option<&RelationshipDecl> {
        self.to_one.get(name)
    }

    /// Iterates over to-one declarations in declaration order.
    pub fn to_one_relationships(&self) -> impl Iterator<Item = (&str, &RelationshipDecl)> {
        self.to_one.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    /// Returns the to-many declaration for `name`.
    #[must_use]
    pub fn to_many(&self, name: &str) -> Option<&RelationshipDecl> {
        self.to_many.get(name)
    }

    /// Iterates over to-many declarations in declaration order.
    pub fn to_many_relationships(&self) -> impl Iterator<Item = (&str, &RelationshipDecl)> {
        self.to_many.iter().map(|(name, decl)| (name.as_str(), decl))
    }
}

/// Builder for [`ResourceSchema`].
///
/// Declaring the same name twice replaces the earlier declaration.
#[derive(Debug)]
pub struct ResourceSchemaBuilder {
    schema: ResourceSchema,
}

impl ResourceSchemaBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            schema: ResourceSchema {
                type_name: type_name.into(),
                attributes: IndexMap::new(),
                to_one: IndexMap::new(),
                to_many: IndexMap::new(),
            },
        }
    }

    /// Declares an attribute that starts out `null`.
    #[must_use]
    pub fn attribute(self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.attribute_with_default(name, attribute_type, AttributeValue::NULL)
    }

    /// Declares an attribute with a default value for new resources.
    #[must_use]
    pub fn attribute_with_default(
        mut self,
        name: impl Into<String>,
        attribute_type: AttributeType,
        default: impl Into<AttributeValue>,
    ) -> Self {
        self.schema.attributes.insert(
            name.into(),
            AttributeDecl {
                attribute_type,
                default: default.into(),
            },
        );
        self
    }

    /// Declares a to-one relationship.
    #[must_use]
    pub fn to_one(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(name, target_type, false, false)
    }

    /// Declares a to-one relationship whose target is saved with the owner.
    #[must_use]
    pub fn auto_saved_to_one(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(name, target_type, false, true)
    }

    /// Declares a to-many relationship.
    #[must_use]
    pub fn to_many(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(name, target_type, true, false)
    }

    /// Declares a to-many relationship whose members are saved with the owner.
    #[must_use]
    pub fn auto_saved_to_many(
        self,
        name: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        self.relationship(name, target_type, true, true)
    }

    fn relationship(
        mut self,
        name: impl Into<String>,
        target_type: impl Into<String>,
        many: bool,
        auto_save: bool,
    ) -> Self {
        let decl = RelationshipDecl {
            target_type: target_type.into(),
            auto_save,
        };
        if many {
            self.schema.to_many.insert(name.into(), decl);
        } else {
            self.schema.to_one.insert(name.into(), decl);
        }
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> ResourceSchema {
        self.schema
    }
}

/// A statically declared resource type.
///
/// Implement this for a marker type and register it with
/// [`ResourceStore::register`](crate::ResourceStore::register).
pub trait ResourceClass {
    /// The JSON:API type name.
    const TYPE: &'static str;

    /// Adds this type's attributes and relationships to `schema`.
    fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder;

    /// Builds the full schema.
    #[must_use]
    fn schema() -> ResourceSchema {
        Self::declare(ResourceSchema::builder(Self::TYPE)).build()
    }
}
