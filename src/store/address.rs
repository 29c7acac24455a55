//! Request paths for resources.
//!
//! Every resource lives at `{type}` (the collection) or `{type}/{id}` (a
//! member), relative to the configured base URL. Segments are
//! percent-encoded so ids containing `/` or spaces stay a single segment.
//!
//! # Example
//!
//! ```rust
//! use jsonapi_store::store::resource_address;
//!
//! assert_eq!(resource_address("widget", None), "widget");
//! assert_eq!(resource_address("widget", Some("1")), "widget/1");
//! assert_eq!(resource_address("widget", Some("a b")), "widget/a%20b");
//! ```

/// Builds the path for a resource type, or for one member when `id` is given.
///
/// An empty `id` addresses the collection, which is where new resources are
/// POSTed.
#[must_use]
pub fn resource_address(type_name: &str, id: Option<&str>) -> String {
    let type_segment = urlencoding::encode(type_name);
    match id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{type_segment}/{}", urlencoding::encode(id)),
        None => type_segment.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_address() {
        assert_eq!(resource_address("widget", None), "widget");
    }

    #[test]
    fn test_member_address() {
        assert_eq!(resource_address("widget", Some("42")), "widget/42");
    }

    #[test]
    fn test_empty_id_addresses_collection() {
        assert_eq!(resource_address("widget", Some("")), "widget");
    }

    #[test]
    fn test_segments_are_encoded() {
        assert_eq!(resource_address("widget", Some("a/b")), "widget/a%2Fb");
        assert_eq!(
            resource_address("line items", Some("1")),
            "line%20items/1"
        );
    }
}
