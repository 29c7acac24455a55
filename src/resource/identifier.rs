//! Resource identifiers: the `(type, id)` pair behind every lazy reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::resource::ResourceError;

/// A JSON:API resource identifier object.
///
/// An identifier names a resource without carrying its attributes. The store
/// can turn one into a full [`Resource`](crate::Resource) with
/// [`ResourceStore::find`](crate::ResourceStore::find).
///
/// # Example
///
/// ```rust
/// use jsonapi_store::ResourceIdentifier;
/// use serde_json::json;
///
/// let identifier = ResourceIdentifier::decode(&json!({"type": "tag", "id": "5"})).unwrap();
/// assert_eq!(identifier.type_name(), "tag");
/// assert_eq!(identifier.encode_identifier(), json!({"data": {"id": "5", "type": "tag"}}));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    type_name: String,
    id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Returns the resource type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the resource id (empty for never-persisted resources).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` once the resource has a server-assigned id.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        !self.id.is_empty()
    }

    /// Decodes an identifier from a resource object or resource linkage.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidData`] when `type` or `id` is missing
    /// or not a string.
    pub fn decode(data: &Value) -> Result<Self, ResourceError> {
        let (type_name, id) = validate_data(data)?;
        Ok(Self::new(type_name, id))
    }

    /// Encodes this identifier as a relationship document.
    #[must_use]
    pub fn encode_identifier(&self) -> Value {
        json!({ "data": self.linkage() })
    }

    /// Returns the bare linkage object `{"id": .., "type": ..}`.
    #[must_use]
    pub fn linkage(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.type_name,
        })
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        id.clone_into(&mut self.id);
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_name, self.id)
    }
}

/// Checks that `data` carries string `type` and `id` members.
pub(crate) fn validate_data(data: &Value) -> Result<(&str, &str), ResourceError> {
    let type_name = match data.get("type") {
        None | Some(Value::Null) => {
            return Err(ResourceError::invalid_data(
                "Resource data is missing required \"type\" field.",
                data,
            ))
        }
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(ResourceError::invalid_data(
                "Resource data \"type\" field is not a string.",
                data,
            ))
        }
    };

    let id = match data.get("id") {
        None | Some(Value::Null) => {
            return Err(ResourceError::invalid_data(
                "Resource data is missing required \"id\" field.",
                data,
            ))
        }
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(ResourceError::invalid_data(
                "Resource data \"id\" field is not a string.",
                data,
            ))
        }
    };

    Ok((type_name, id))
}
