//! Reference resolution module.
//!
//! Walks a parsed document and turns `$ref` placeholders into links to the
//! objects they designate, recording the references it cannot resolve.

mod diagnostics;
mod index;
mod resolver;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use index::{ComponentCategory, Entity, ReferenceIndex, Referenceable};
pub use resolver::ReferenceResolver;

use crate::config::ResolverConfig;
use crate::schema::InMemorySchemaRegistry;
use crate::types::Document;

/// Resolves `document` against its own components and schemas.
///
/// Builds the reference index and schema registry from the document, runs
/// one walk, and returns what could not be resolved. An empty result means
/// every local reference was linked.
pub fn resolve_document(document: &mut Document, config: &ResolverConfig) -> Diagnostics {
    let index = ReferenceIndex::from_document(document);
    let schemas = InMemorySchemaRegistry::from_document(document, &config.schema_authority);
    let mut resolver = ReferenceResolver::new(&index, &schemas, config);
    resolver.resolve_document(document);
    resolver.into_diagnostics()
}
