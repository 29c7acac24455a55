//! Type-name to schema registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::resource::{ResourceClass, ResourceError, ResourceSchema};

/// Maps JSON:API type names to the schemas used to build resources.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ResourceSchema>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` under `type_name`, replacing any earlier entry.
    pub fn add_class(&mut self, type_name: impl Into<String>, schema: ResourceSchema) {
        let type_name = type_name.into();
        if schema.type_name() != type_name {
            tracing::warn!(
                "Registering schema for \u{201c}{}\u{201d} under type \u{201c}{}\u{201d}",
                schema.type_name(),
                type_name
            );
        }
        self.classes.insert(type_name, Arc::new(schema));
    }

    /// Registers a statically declared resource type.
    pub fn register<C: ResourceClass>(&mut self) {
        self.add_class(C::TYPE, C::schema());
    }

    /// Returns the schema registered for `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ClassNotFound`] when nothing is registered.
    pub fn get_class(&self, type_name: &str) -> Result<Arc<ResourceSchema>, ResourceError> {
        self.classes
            .get(type_name)
            .cloned()
            .ok_or_else(|| ResourceError::ClassNotFound {
                type_name: type_name.to_string(),
            })
    }

    /// Returns `true` when a schema is registered for `type_name`.
    #[must_use]
    pub fn has_class(&self, type_name: &str) -> bool {
        self.classes.contains_key(type_name)
    }
}

// Verify ClassRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClassRegistry>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{AttributeType, ResourceSchemaBuilder};

    struct Widget;

    impl ResourceClass for Widget {
        const TYPE: &'static str = "widget";

        fn declare(schema: ResourceSchemaBuilder) -> ResourceSchemaBuilder {
            schema.attribute("title", AttributeType::String)
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ClassRegistry::new();
        registry.register::<Widget>();

        assert!(registry.has_class("widget"));
        let schema = registry.get_class("widget").unwrap();
        assert!(schema.attribute("title").is_some());
    }

    #[test]
    fn test_missing_class() {
        let registry = ClassRegistry::new();
        assert!(!registry.has_class("widget"));
        assert!(matches!(
            registry.get_class("widget"),
            Err(ResourceError::ClassNotFound { ref type_name }) if type_name == "widget"
        ));
    }

    #[test]
    fn test_add_class_replaces() {
        let mut registry = ClassRegistry::new();
        registry.add_class("tag", ResourceSchema::builder("tag").build());
        registry.add_class(
            "tag",
            ResourceSchema::builder("tag")
                .attribute("label", AttributeType::String)
                .build(),
        );

        assert!(registry.get_class("tag").unwrap().attribute("label").is_some());
    }
}
