//! Integration tests for the resource model.
//!
//! These cover decoding and encoding JSON:API resource objects, relationship
//! bookkeeping and attribute coercion without any network traffic.

use std::sync::Arc;

use jsonapi_store::resource::{format_date, parse_date};
use jsonapi_store::{
    AttributeType, AttributeValue, EncodeOptions, Resource, ResourceClass, ResourceCollection,
    ResourceError, ResourceHandle, ResourceIdentifier, ResourceSchemaBuilder,
};
use serde_json::json;

struct Article;

impl ResourceClass for Article {
    const TYPE: &'static str = "article";

    fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
        schema
            .attribute("title", AttributeType::String)
            .attribute("words", AttributeType::Number)
            .attribute("published", AttributeType::Date)
            .attribute_with_default("state", AttributeType::String, "draft")
            .to_one("author", "person")
            .to_many("comments", "comment")
    }
}

struct Person;

impl ResourceClass for Person {
    const TYPE: &'static str = "person";

    fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
        schema.attribute("name", AttributeType::String)
    }
}

fn article() -> Resource {
    Resource::new(Arc::new(Article::schema()))
}

fn saved_person(id: &str) -> ResourceHandle {
    let mut person = Resource::new(Arc::new(Person::schema()));
    person
        .decode(&json!({"type": "person", "id": id, "attributes": {"name": "Ada"}}))
        .unwrap();
    ResourceHandle::new(person)
}

fn article_data() -> serde_json::Value {
    json!({
        "type": "article",
        "id": "1",
        "attributes": {
            "title": "Rust",
            "words": 1200,
            "published": "2024-03-01T09:30:00+02:00",
            "state": "live"
        },
        "relationships": {
            "author": {"data": {"type": "person", "id": "9"}},
            "comments": {"data": [
                {"type": "comment", "id": "5"},
                {"type": "comment", "id": "12"}
            ]}
        }
    })
}

// ============================================================================
// Decode / Encode
// ============================================================================

#[test]
fn test_decode_then_encode_preserves_content() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    assert!(!resource.is_modified());
    assert_eq!(resource.id(), "1");
    assert_eq!(resource.attribute("words").unwrap().as_i64(), Some(1200));

    let document = resource.encode(&EncodeOptions::default());
    let data = &document["data"];
    assert_eq!(data["id"], json!("1"));
    assert_eq!(data["type"], json!("article"));
    assert_eq!(data["attributes"]["title"], json!("Rust"));
    assert_eq!(data["attributes"]["state"], json!("live"));
    assert_eq!(
        data["attributes"]["published"],
        json!("2024-03-01T09:30:00+02:00")
    );
    assert_eq!(
        data["relationships"]["comments"],
        json!({"data": [
            {"id": "5", "type": "comment"},
            {"id": "12", "type": "comment"}
        ]})
    );
    assert!(data["relationships"].get("author").is_none());
}

#[test]
fn test_new_resource_uses_declared_defaults() {
    let resource = article();

    assert!(!resource.is_saved());
    assert!(resource.is_modified());
    assert_eq!(resource.attribute("state").unwrap().as_str(), Some("draft"));
    assert!(resource.attribute("title").unwrap().is_null());

    let document = resource.encode(&EncodeOptions::default());
    assert!(document["data"].get("id").is_none());
    assert_eq!(document["data"]["attributes"]["state"], json!("draft"));
}

#[test]
fn test_reassigned_to_one_is_encoded() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    resource.set_to_one("author", Some(saved_person("3"))).unwrap();
    assert!(resource.is_modified());

    let document = resource.encode(&EncodeOptions::default());
    assert_eq!(
        document["data"]["relationships"]["author"],
        json!({"data": {"id": "3", "type": "person"}})
    );
}

#[test]
fn test_reassigning_same_identity_is_not_a_change() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    resource.set_to_one("author", Some(saved_person("9"))).unwrap();

    assert!(!resource.is_modified());
    let document = resource.encode(&EncodeOptions::default());
    assert!(document["data"]["relationships"].get("author").is_none());
}

#[test]
fn test_cleared_to_one_encodes_null() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    resource.set_to_one("author", None).unwrap();

    let document = resource.encode(&EncodeOptions::default());
    assert_eq!(
        document["data"]["relationships"]["author"],
        json!({"data": null})
    );
}

#[test]
fn test_to_many_omitted_without_replace() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();
    resource.set_attribute("title", "Rust 2024").unwrap();

    let document = resource.encode(&EncodeOptions {
        to_many_replace: false,
    });

    assert_eq!(document["data"]["relationships"], json!({}));
    assert_eq!(document["data"]["attributes"]["title"], json!("Rust 2024"));
}

#[test]
fn test_decode_null_clears_to_one() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    resource
        .decode(&json!({
            "type": "article",
            "id": "1",
            "relationships": {"author": {"data": null}}
        }))
        .unwrap();

    assert!(resource.to_one("author").unwrap().identifier().is_none());
    assert_eq!(resource.attribute("title").unwrap().as_str(), Some("Rust"));
}

#[test]
fn test_decode_ignores_unknown_members() {
    let mut resource = article();
    resource
        .decode(&json!({
            "type": "article",
            "id": "1",
            "attributes": {"title": "Rust", "rating": 5},
            "relationships": {
                "editor": {"data": {"type": "person", "id": "2"}},
                "author": {"links": {"related": "/article/1/author"}}
            }
        }))
        .unwrap();

    assert!(matches!(
        resource.attribute("rating"),
        Err(ResourceError::InvalidProperty { .. })
    ));
    assert!(resource.to_one("author").unwrap().identifier().is_none());
}

#[test]
fn test_decode_rejects_wrong_type() {
    let mut resource = article();

    let result = resource.decode(&json!({"type": "person", "id": "1"}));
    assert!(matches!(
        result,
        Err(ResourceError::InvalidResourceType { ref expected, ref actual })
            if expected == "article" && actual == "person"
    ));
    assert!(!resource.is_saved());
}

#[test]
fn test_decode_failure_changes_nothing() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    let result = resource.decode(&json!({
        "type": "article",
        "id": "1",
        "attributes": {"title": "Changed"},
        "relationships": {"author": {"data": {"type": "comment", "id": "4"}}}
    }));

    assert!(matches!(result, Err(ResourceError::InvalidResourceType { .. })));
    assert_eq!(resource.attribute("title").unwrap().as_str(), Some("Rust"));
    assert_eq!(
        resource.to_one("author").unwrap().identifier(),
        Some(ResourceIdentifier::new("person", "9"))
    );
}

#[test]
fn test_decode_rejects_unparseable_date() {
    let mut resource = article();

    let result = resource.decode(&json!({
        "type": "article",
        "id": "1",
        "attributes": {"published": "next tuesday"}
    }));

    assert!(matches!(result, Err(ResourceError::InvalidData { .. })));
}

// ============================================================================
// Relationships
// ============================================================================

#[test]
fn test_to_one_type_mismatch_leaves_state_untouched() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    let mut other = article();
    other.decode(&json!({"type": "article", "id": "2"})).unwrap();

    let result = resource.set_to_one("author", Some(ResourceHandle::new(other)));

    assert!(matches!(result, Err(ResourceError::InvalidResourceType { .. })));
    assert!(!resource.is_modified());
    assert_eq!(
        resource.to_one("author").unwrap().identifier(),
        Some(ResourceIdentifier::new("person", "9"))
    );
}

#[test]
fn test_to_many_add_and_remove() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    let comments = resource.to_many_mut("comments").unwrap();
    comments
        .collection_mut()
        .unwrap()
        .add_identifier(ResourceIdentifier::new("comment", "20"))
        .unwrap();
    assert!(comments.remove("5"));
    assert!(!comments.remove("5"));

    assert_eq!(comments.keys(), vec!["12", "20"]);
    assert!(resource.is_modified());
}

#[test]
fn test_to_many_rejects_wrong_type() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    let result = resource
        .to_many_mut("comments")
        .unwrap()
        .add(saved_person("1"));

    assert!(matches!(result, Err(ResourceError::InvalidResourceType { .. })));
    assert_eq!(resource.to_many("comments").unwrap().len(), 2);
    assert!(!resource.is_modified());
}

#[test]
fn test_collection_rejects_unsaved_members() {
    let mut collection = ResourceCollection::new("person");
    let unsaved = ResourceHandle::new(Resource::new(Arc::new(Person::schema())));

    let result = collection.add(unsaved);

    assert!(matches!(result, Err(ResourceError::InvalidData { .. })));
    assert!(collection.is_empty());
}

#[test]
fn test_collection_replaces_member_with_same_id() {
    let mut collection = ResourceCollection::new("person");
    collection
        .add_identifier(ResourceIdentifier::new("person", "1"))
        .unwrap();

    let person = saved_person("1");
    collection.add(person.clone()).unwrap();

    assert_eq!(collection.len(), 1);
    assert!(collection.resolved()[0].ptr_eq(&person));
}

#[test]
fn test_undeclared_relationship_is_invalid_property() {
    let mut resource = article();

    assert!(matches!(
        resource.set_to_one("editor", None),
        Err(ResourceError::InvalidProperty { ref name, .. }) if name == "editor"
    ));
    assert!(matches!(
        resource.to_many("author"),
        Err(ResourceError::InvalidProperty { .. })
    ));
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_date_attribute_accepts_strings() {
    let mut resource = article();

    resource.set_attribute("published", "2024-03-01 08:00:00").unwrap();

    let value = resource.attribute("published").unwrap();
    assert_eq!(
        value.as_date().map(format_date),
        Some("2024-03-01T08:00:00+00:00".to_string())
    );
}

#[test]
fn test_date_attribute_rejects_garbage() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    let result = resource.set_attribute("published", "soon");

    assert!(matches!(result, Err(ResourceError::InvalidData { .. })));
    assert!(!resource.is_modified());
}

#[test]
fn test_null_clears_attribute() {
    let mut resource = article();
    resource.decode(&article_data()).unwrap();

    resource.set_attribute("published", AttributeValue::NULL).unwrap();

    assert!(resource.attribute("published").unwrap().is_null());
    let document = resource.encode(&EncodeOptions::default());
    assert_eq!(document["data"]["attributes"]["published"], json!(null));
}

#[test]
fn test_parse_date_formats() {
    let offset = parse_date("2024-03-01T09:30:00+02:00").unwrap();
    assert_eq!(format_date(&offset), "2024-03-01T09:30:00+02:00");

    let zulu = parse_date("2024-03-01T09:30:00Z").unwrap();
    assert_eq!(format_date(&zulu), "2024-03-01T09:30:00+00:00");

    let bare = parse_date("2024-03-01").unwrap();
    assert_eq!(format_date(&bare), "2024-03-01T00:00:00+00:00");

    assert!(parse_date("01/03/2024 maybe").is_none());
}
