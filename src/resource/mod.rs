//! The JSON:API entity model.
//!
//! This module contains everything a resource is made of, independent of
//! how it is fetched:
//!
//! - [`ResourceIdentifier`]: The `(type, id)` pair
//! - [`ResourceSchema`] / [`ResourceClass`]: Per-type declarations
//! - [`Resource`]: Attributes, relationships, dirty tracking, encode/decode
//! - [`ResourceHandle`]: Shared access plus save, delete and lazy loading
//! - [`ToOneRelationship`] / [`ToManyRelationship`] / [`ResourceCollection`]:
//!   Relationship containers holding [`Reference`]s
//! - [`ResourceSnapshot`]: A serializable copy of a resource's state
//! - [`ResourceError`]: The error type for all of the above
//!
//! # Lazy loading
//!
//! Decoding a document never fetches related resources. Relationships hold
//! [`Reference::Unresolved`] identifiers until they are read through a
//! [`ResourceStore`](crate::ResourceStore), at which point the loaded
//! resource is kept in place of the identifier.

mod attribute;
mod collection;
mod errors;
mod handle;
mod identifier;
mod relationship;
#[allow(clippy::module_inception)]
mod resource;
mod schema;
mod snapshot;

pub use attribute::{format_date, parse_date, AttributeType, AttributeValue};
pub use collection::ResourceCollection;
pub use errors::ResourceError;
pub use handle::ResourceHandle;
pub use identifier::ResourceIdentifier;
pub use relationship::{Reference, ToManyRelationship, ToOneRelationship};
pub use resource::{EncodeOptions, Resource};
pub use schema::{
    AttributeDecl, RelationshipDecl, ResourceClass, ResourceSchema, ResourceSchemaBuilder,
};
pub use snapshot::ResourceSnapshot;
