//! Error types for resource and store operations.
//!
//! # Error Handling
//!
//! Every failure is reported at the point of detection and none is retried.
//! The only recovered case is a JSON:API `404` error during
//! [`ResourceStore::query`](crate::ResourceStore::query) (and therefore
//! [`ResourceStore::find`](crate::ResourceStore::find)), which becomes
//! `Ok(None)`. Everywhere else [`ResourceError::NotFound`] is an error like
//! any other.
//!
//! Variants carry the raw JSON that caused them so callers can decide on
//! retries or user messaging.
//!
//! # Example
//!
//! ```rust,ignore
//! use jsonapi_store::ResourceError;
//!
//! match widget.save(&store).await {
//!     Ok(_) => println!("saved"),
//!     Err(ResourceError::ErrorResponse { message, error }) => {
//!         println!("server refused: {message} ({error})");
//!     }
//!     Err(ResourceError::NotFound { .. }) => println!("it was deleted meanwhile"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::clients::HttpError;

/// Error type for resource, relationship and store operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A document is malformed or incomplete.
    ///
    /// Raised for missing or non-string `type`/`id`, a missing top-level
    /// `data`, an envelope with neither `data`, `errors` nor `meta`, or an
    /// attribute value that cannot be converted (such as an unparseable date).
    #[error("Invalid data: {message}")]
    InvalidData {
        /// What was wrong.
        message: String,
        /// The offending raw document.
        data: Value,
    },

    /// A resource's type does not match the expected type.
    #[error("Resource type \u{201c}{actual}\u{201d} provided does not match expected type \u{201c}{expected}\u{201d}")]
    InvalidResourceType {
        /// The declared or expected type.
        expected: String,
        /// The type that was provided.
        actual: String,
    },

    /// An attribute or relationship name is not declared by the resource type.
    #[error("Property \u{201c}{name}\u{201d} is not declared on resource type \u{201c}{resource_type}\u{201d}")]
    InvalidProperty {
        /// The undeclared name.
        name: String,
        /// The resource type that was accessed.
        resource_type: String,
    },

    /// A network operation was attempted on a store without a transport.
    #[error("No transport is attached to this resource store. Call ResourceStore::attach() first.")]
    NoResourceStore,

    /// No schema is registered for a type name.
    #[error("No class for type \u{201c}{type_name}\u{201d} defined.")]
    ClassNotFound {
        /// The unregistered type name.
        type_name: String,
    },

    /// The server reported a JSON:API error with status `404`.
    #[error("Resource not found: {message}")]
    NotFound {
        /// Human-readable message taken from the error object.
        message: String,
        /// The raw JSON:API error object.
        error: Value,
    },

    /// The server reported any other JSON:API error.
    #[error("{message}")]
    ErrorResponse {
        /// Human-readable message taken from the error object.
        message: String,
        /// The raw JSON:API error object.
        error: Value,
    },

    /// A response body is not a parseable JSON object.
    #[error("Invalid JSON received: {message}")]
    InvalidJson {
        /// Why the body was rejected.
        message: String,
    },

    /// A cached resource could not be refreshed because it is borrowed.
    ///
    /// Raised when a response carries a resource whose
    /// [`ResourceHandle`](crate::ResourceHandle) is still borrowed by the
    /// caller while the request is in flight.
    #[error("Resource {type_name}/{id} is borrowed and cannot be refreshed")]
    ResourceInUse {
        /// The resource type.
        type_name: String,
        /// The resource id.
        id: String,
    },

    /// The transport failed to deliver the request or response.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl ResourceError {
    pub(crate) fn invalid_data(message: impl Into<String>, data: &Value) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: data.clone(),
        }
    }

    pub(crate) fn invalid_type(expected: &str, actual: &str) -> Self {
        Self::InvalidResourceType {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn invalid_property(name: &str, resource_type: &str) -> Self {
        Self::InvalidProperty {
            name: name.to_string(),
            resource_type: resource_type.to_string(),
        }
    }

    /// Returns `true` for a server-reported `404`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the raw JSON:API error object, for server-reported errors.
    #[must_use]
    pub const fn error_object(&self) -> Option<&Value> {
        match self {
            Self::NotFound { error, .. } | Self::ErrorResponse { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns the raw document, for [`ResourceError::InvalidData`].
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::InvalidData { data, .. } => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpResponseError;
    use serde_json::json;

    #[test]
    fn test_invalid_data_keeps_raw_document() {
        let raw = json!({"id": "1"});
        let error = ResourceError::invalid_data("Resource data is missing required \"type\" field.", &raw);

        assert!(error.to_string().contains("\"type\""));
        assert_eq!(error.data(), Some(&raw));
    }

    #[test]
    fn test_invalid_resource_type_message() {
        let error = ResourceError::invalid_type("widget", "gadget");
        let message = error.to_string();
        assert!(message.contains("gadget"));
        assert!(message.contains("widget"));
    }

    #[test]
    fn test_class_not_found_message() {
        let error = ResourceError::ClassNotFound {
            type_name: "widget".to_string(),
        };
        assert_eq!(error.to_string(), "No class for type \u{201c}widget\u{201d} defined.");
    }

    #[test]
    fn test_resource_in_use_message() {
        let error = ResourceError::ResourceInUse {
            type_name: "widget".to_string(),
            id: "1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Resource widget/1 is borrowed and cannot be refreshed"
        );
    }

    #[test]
    fn test_error_object_accessor() {
        let raw = json!({"status": "422", "detail": "Name is taken"});
        let error = ResourceError::ErrorResponse {
            message: "Name is taken".to_string(),
            error: raw.clone(),
        };
        assert_eq!(error.error_object(), Some(&raw));
        assert_eq!(error.to_string(), "Name is taken");
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_not_found_is_flagged() {
        let error = ResourceError::NotFound {
            message: "gone".to_string(),
            error: json!({"status": "404"}),
        };
        assert!(error.is_not_found());
        assert!(error.data().is_none());
    }

    #[test]
    fn test_http_error_wraps_transparently() {
        let error: ResourceError = HttpError::Response(HttpResponseError {
            code: 502,
            message: "Bad Gateway".to_string(),
        })
        .into();
        assert_eq!(error.to_string(), "HTTP 502: Bad Gateway");
        assert!(error.error_object().is_none());
    }
}
