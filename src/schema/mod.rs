/// Schema nodes and the rebuild-from-children pattern.
mod node;

/// Absolute-locator lookup for embedded schemas.
mod registry;

pub use node::{AdditionalProperties, Schema, SchemaChildren, SchemaNode, SchemaSlot};
pub use registry::{schema_locator, InMemorySchemaRegistry, SchemaRegistry, DEFAULT_SCHEMA_AUTHORITY};
