use std::collections::HashMap;

use crate::reference::escape_segment;
use crate::schema::Schema;
use crate::types::Document;

/// Authority used to build absolute schema locators when none is configured.
pub const DEFAULT_SCHEMA_AUTHORITY: &str = "http://everything.json";

/// Lookup surface for embedded schemas, keyed by absolute locator.
///
/// The resolver treats a registry as read-only; it is never mutated during
/// a walk.
pub trait SchemaRegistry {
    /// Returns the schema registered under `locator`, if any.
    fn get(&self, locator: &str) -> Option<Schema>;
}

/// Builds the absolute locator for a local schema pointer.
///
/// `#/components/schemas/Pet` under authority `http://everything.json`
/// becomes `http://everything.json/components/schemas/Pet`.
pub fn schema_locator(authority: &str, pointer: &str) -> String {
    let path = pointer.strip_prefix('#').unwrap_or(pointer);
    let authority = authority.trim_end_matches('/');
    if path.starts_with('/') || path.is_empty() {
        format!("{}{}", authority, path)
    } else {
        format!("{}/{}", authority, path)
    }
}

/// A `HashMap`-backed schema registry.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaRegistry {
    authority: String,
    schemas: HashMap<String, Schema>,
}

impl InMemorySchemaRegistry {
    /// Creates an empty registry whose locators use `authority`.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            schemas: HashMap::new(),
        }
    }

    /// Creates a registry holding every schema in `components.schemas`,
    /// along with each of their sub-schemas under its own pointer
    /// (`#/components/schemas/Pet/properties/name`, ...).
    pub fn from_document(document: &Document, authority: &str) -> Self {
        let mut registry = Self::new(authority);
        if let Some(components) = &document.components {
            for (name, schema) in &components.schemas {
                let pointer = format!("#/components/schemas/{}", escape_segment(name));
                registry.register_tree(&pointer, schema);
            }
        }
        registry
    }

    fn register_tree(&mut self, pointer: &str, schema: &Schema) {
        self.register(pointer, schema.clone());
        schema.for_each_child(|slot, child| {
            let mut nested = pointer.to_string();
            for segment in slot.segments() {
                nested.push('/');
                nested.push_str(&escape_segment(&segment));
            }
            self.register_tree(&nested, child);
        });
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Registers `schema` under the locator derived from a local pointer.
    pub fn register(&mut self, pointer: &str, schema: Schema) {
        let locator = schema_locator(&self.authority, pointer);
        self.schemas.insert(locator, schema);
    }

    /// Registers `schema` as `#/components/schemas/<name>`.
    pub fn register_component(&mut self, name: &str, schema: Schema) {
        let pointer = format!("#/components/schemas/{}", escape_segment(name));
        self.register(&pointer, schema);
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn get(&self, locator: &str) -> Option<Schema> {
        self.schemas.get(locator).cloned()
    }
}
