use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::errors::ResolveError;
use crate::reference::{escape_segment, Reference};
use crate::resolution::diagnostics::{Diagnostic, Diagnostics};
use crate::resolution::index::{ReferenceIndex, Referenceable};
use crate::schema::{schema_locator, Schema, SchemaRegistry};
use crate::types::*;

/// Walks one document and replaces every locally resolvable reference with a
/// link to the object it designates.
///
/// Component references are looked up in a [`ReferenceIndex`]; schema
/// pointers go through a [`SchemaRegistry`]. Failures are collected as
/// [`Diagnostics`] and never stop the walk. A second walk over an already
/// resolved document changes nothing and reports nothing new.
pub struct ReferenceResolver<'a> {
    index: &'a ReferenceIndex,
    schemas: &'a dyn SchemaRegistry,
    config: &'a ResolverConfig,
    /// Location of the document being walked, stamped onto diagnostics.
    host: Option<String>,
    diagnostics: Diagnostics,
    /// Pointer segments from the document root to the current holder.
    path: Vec<String>,
    /// Addresses of shared entities already walked.
    visited: HashSet<usize>,
    /// Fully resolved schemas by locator.
    resolved_schemas: HashMap<String, Schema>,
    /// Whether a locator can reach itself through schema pointers.
    cyclic_schemas: HashMap<String, bool>,
    /// Tags created for operation tags that name no declared tag.
    synthesized_tags: HashMap<String, Shared<Tag>>,
    resolved_count: usize,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over the given index and schema registry.
    pub fn new(
        index: &'a ReferenceIndex,
        schemas: &'a dyn SchemaRegistry,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            index,
            schemas,
            config,
            host: None,
            diagnostics: Diagnostics::new(),
            path: Vec::new(),
            visited: HashSet::new(),
            resolved_schemas: HashMap::new(),
            cyclic_schemas: HashMap::new(),
            synthesized_tags: HashMap::new(),
            resolved_count: 0,
        }
    }

    /// Resolves every reference reachable from `document`, in place.
    ///
    /// Visiting order: top-level tags, the components bucket, every path
    /// item and its operations, webhooks, then document-level security
    /// requirements.
    pub fn resolve_document(&mut self, document: &mut Document) {
        self.host = document.location.clone();
        let reported_before = self.diagnostics.len();
        let resolved_before = self.resolved_count;

        self.at("tags", |this| {
            for (i, tag) in document.tags.iter_mut().enumerate() {
                this.at(i.to_string(), |this| this.resolve_tag(tag));
            }
        });

        if let Some(components) = document.components.as_mut() {
            self.at("components", |this| this.walk_components(components));
        }

        self.at("paths", |this| {
            this.walk_edge_map(&mut document.paths, Self::walk_path_item)
        });
        self.at("webhooks", |this| {
            this.walk_edge_map(&mut document.webhooks, Self::walk_path_item)
        });
        self.at("security", |this| this.walk_security(&mut document.security));

        info!(
            resolved = self.resolved_count - resolved_before,
            diagnostics = self.diagnostics.len() - reported_before,
            "reference walk complete"
        );
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consumes the resolver, handing the collected diagnostics to the caller.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Number of edges rewritten so far, synthesized tags included.
    pub fn resolved_count(&self) -> usize {
        self.resolved_count
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    fn walk_components(&mut self, components: &mut Components) {
        self.at("parameters", |this| {
            this.walk_edge_map(&mut components.parameters, Self::walk_parameter)
        });
        self.at("requestBodies", |this| {
            this.walk_edge_map(&mut components.request_bodies, Self::walk_request_body)
        });
        self.at("responses", |this| {
            this.walk_edge_map(&mut components.responses, Self::walk_response)
        });
        self.at("links", |this| {
            this.walk_edge_map(&mut components.links, Self::leaf)
        });
        self.at("callbacks", |this| {
            this.walk_edge_map(&mut components.callbacks, Self::walk_callback)
        });
        self.at("examples", |this| {
            this.walk_edge_map(&mut components.examples, Self::leaf)
        });
        self.at("schemas", |this| {
            this.walk_component_schemas(&mut components.schemas)
        });
        self.at("pathItems", |this| {
            this.walk_edge_map(&mut components.path_items, Self::walk_path_item)
        });
        self.at("securitySchemes", |this| {
            this.walk_edge_map(&mut components.security_schemes, Self::leaf)
        });
        self.at("headers", |this| {
            this.walk_edge_map(&mut components.headers, Self::walk_header)
        });
    }

    fn walk_component_schemas(&mut self, schemas: &mut IndexMap<String, Schema>) {
        for (name, schema) in schemas.iter_mut() {
            let pointer = format!("#/components/schemas/{}", escape_segment(name));
            self.at(name.as_str(), |this| {
                let resolved = this.resolve_named_schema(&pointer, schema);
                *schema = resolved;
            });
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    fn walk_path_item(&mut self, item: &mut PathItem) {
        self.at("parameters", |this| {
            this.walk_edge_list(&mut item.parameters, Self::walk_parameter)
        });
        for (method, operation) in item.operations_mut() {
            self.at(method, |this| this.walk_operation(operation));
        }
    }

    fn walk_operation(&mut self, operation: &mut Operation) {
        if let Some(body) = operation.request_body.as_mut() {
            self.at("requestBody", |this| {
                this.walk_edge(body, Self::walk_request_body)
            });
        }
        self.at("parameters", |this| {
            this.walk_edge_list(&mut operation.parameters, Self::walk_parameter)
        });
        self.at("tags", |this| {
            for (i, tag) in operation.tags.iter_mut().enumerate() {
                this.at(i.to_string(), |this| this.resolve_tag(tag));
            }
        });
        self.at("responses", |this| {
            this.walk_edge_map(&mut operation.responses, Self::walk_response)
        });
        self.at("callbacks", |this| {
            this.walk_edge_map(&mut operation.callbacks, Self::walk_callback)
        });
        self.at("security", |this| this.walk_security(&mut operation.security));
    }

    fn walk_parameter(&mut self, parameter: &mut Parameter) {
        self.walk_schema_slot(&mut parameter.schema);
        self.at("examples", |this| {
            this.walk_edge_map(&mut parameter.examples, Self::leaf)
        });
        self.at("content", |this| this.walk_content(&mut parameter.content));
    }

    fn walk_request_body(&mut self, body: &mut RequestBody) {
        self.at("content", |this| this.walk_content(&mut body.content));
    }

    fn walk_response(&mut self, response: &mut Response) {
        self.at("headers", |this| {
            this.walk_edge_map(&mut response.headers, Self::walk_header)
        });
        self.at("content", |this| this.walk_content(&mut response.content));
        self.at("links", |this| {
            this.walk_edge_map(&mut response.links, Self::leaf)
        });
    }

    fn walk_header(&mut self, header: &mut Header) {
        self.walk_schema_slot(&mut header.schema);
        self.at("examples", |this| {
            this.walk_edge_map(&mut header.examples, Self::leaf)
        });
    }

    fn walk_callback(&mut self, callback: &mut Callback) {
        self.walk_edge_map(&mut callback.expressions, Self::walk_path_item);
    }

    fn walk_content(&mut self, content: &mut IndexMap<String, MediaType>) {
        for (media_type, media) in content.iter_mut() {
            self.at(media_type.as_str(), |this| {
                this.walk_schema_slot(&mut media.schema);
                this.at("examples", |this| {
                    this.walk_edge_map(&mut media.examples, Self::leaf)
                });
            });
        }
    }

    /// Security requirements hold their scheme as the key of each entry;
    /// resolving one swaps the key in place and keeps its scopes.
    fn walk_security(&mut self, requirements: &mut [SecurityRequirement]) {
        for (i, requirement) in requirements.iter_mut().enumerate() {
            self.at(i.to_string(), |this| {
                for (scheme, _scopes) in requirement.schemes.iter_mut() {
                    let name = scheme
                        .as_reference()
                        .map(|reference| reference.identifier())
                        .unwrap_or_default();
                    this.at(name, |this| this.walk_edge(scheme, Self::leaf));
                }
            });
        }
    }

    /// Entities with no nested references.
    fn leaf<T>(&mut self, _item: &mut T) {}

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    fn walk_edge_map<T: Referenceable>(
        &mut self,
        edges: &mut IndexMap<String, RefOr<T>>,
        walk: fn(&mut Self, &mut T),
    ) {
        for (key, edge) in edges.iter_mut() {
            self.at(key.as_str(), |this| this.walk_edge(edge, walk));
        }
    }

    fn walk_edge_list<T: Referenceable>(
        &mut self,
        edges: &mut [RefOr<T>],
        walk: fn(&mut Self, &mut T),
    ) {
        for (i, edge) in edges.iter_mut().enumerate() {
            self.at(i.to_string(), |this| this.walk_edge(edge, walk));
        }
    }

    /// Resolves `edge` if it is a placeholder, then walks whatever it points
    /// at.
    fn walk_edge<T: Referenceable>(&mut self, edge: &mut RefOr<T>, walk: fn(&mut Self, &mut T)) {
        self.resolve_edge(edge);
        if let Some(target) = edge.target().cloned() {
            self.enter(&target, walk);
        }
    }

    /// Walks a shared entity unless it was already walked from elsewhere.
    fn enter<T>(&mut self, shared: &Shared<T>, walk: fn(&mut Self, &mut T)) {
        let address = Rc::as_ptr(shared) as *const () as usize;
        if !self.visited.insert(address) {
            return;
        }
        let mut item = shared.borrow_mut();
        walk(self, &mut *item);
    }

    /// Replaces a placeholder with the registered object. On failure the
    /// placeholder stays exactly as it was.
    fn resolve_edge<T: Referenceable>(&mut self, edge: &mut RefOr<T>) {
        let RefOr::Ref(reference) = &*edge else {
            return;
        };
        let reference = reference.clone();
        if let Some(target) = self.lookup::<T>(&reference) {
            *edge = RefOr::Resolved { reference, target };
            self.resolved_count += 1;
        }
    }

    /// Tag placeholders that name no declared tag become a bare tag carrying
    /// only the name. Placeholders for the same name share one tag.
    fn resolve_tag(&mut self, edge: &mut RefOr<Tag>) {
        let RefOr::Ref(reference) = &*edge else {
            return;
        };
        if reference.is_external() || !self.config.synthesize_missing_tags {
            self.resolve_edge(edge);
            return;
        }

        let reference = reference.clone();
        match self.index.resolve::<Tag>(&reference) {
            Ok(target) => {
                debug!(tag = %reference.identifier(), "resolved tag");
                *edge = RefOr::Resolved { reference, target };
            }
            Err(ResolveError::NotFound { .. }) => {
                let name = reference.identifier();
                debug!(tag = %name, "synthesizing undeclared tag");
                let tag = self
                    .synthesized_tags
                    .entry(name.clone())
                    .or_insert_with(|| shared(Tag::named(&name)))
                    .clone();
                *edge = RefOr::Item(tag);
            }
            Err(error) => {
                self.report(error);
                return;
            }
        }
        self.resolved_count += 1;
    }

    fn lookup<T: Referenceable>(&mut self, reference: &Reference) -> Option<Shared<T>> {
        if reference.is_external() {
            debug!(pointer = reference.pointer(), "leaving external reference unresolved");
            if self.config.strict {
                self.report(ResolveError::ExternalUnsupported {
                    reference: reference.clone(),
                });
            }
            return None;
        }

        match self.index.resolve::<T>(reference) {
            Ok(target) => {
                debug!(
                    category = %T::CATEGORY,
                    identifier = %reference.identifier(),
                    "resolved reference"
                );
                Some(target)
            }
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Schemas
    // ------------------------------------------------------------------

    fn walk_schema_slot(&mut self, slot: &mut Option<Schema>) {
        if let Some(schema) = slot.as_mut() {
            self.at("schema", |this| {
                let resolved = this.resolve_schema(schema);
                *schema = resolved;
            });
        }
    }

    /// Returns `schema` with every pointer in its subtree replaced.
    ///
    /// A pointer node is replaced wholesale by its target; sibling keywords
    /// on the pointer node are dropped. Unchanged subtrees keep their `Rc`.
    fn resolve_schema(&mut self, schema: &Schema) -> Schema {
        if let Some(pointer) = &schema.reference {
            return match self.resolve_schema_pointer(pointer) {
                Some(target) => {
                    self.resolved_count += 1;
                    target
                }
                None => schema.clone(),
            };
        }

        let rebuilt = schema.map_children(|slot, child| {
            self.at_all(slot.segments(), |this| this.resolve_schema(child))
        });
        match rebuilt {
            Some(node) => Rc::new(node),
            None => schema.clone(),
        }
    }

    /// Resolves a schema that is itself registered under `pointer`, sharing
    /// the result with every later reference to it.
    fn resolve_named_schema(&mut self, pointer: &str, schema: &Schema) -> Schema {
        let locator = schema_locator(&self.config.schema_authority, pointer);
        if let Some(done) = self.resolved_schemas.get(&locator) {
            return done.clone();
        }

        let resolved = self.resolve_schema(schema);
        self.resolved_schemas.insert(locator, resolved.clone());
        resolved
    }

    fn resolve_schema_pointer(&mut self, pointer: &str) -> Option<Schema> {
        let reference = Reference::new(pointer);
        if reference.is_external() {
            debug!(pointer, "leaving external schema reference unresolved");
            if self.config.strict {
                self.report(ResolveError::ExternalSchema {
                    pointer: pointer.to_string(),
                });
            }
            return None;
        }

        let locator = schema_locator(&self.config.schema_authority, pointer);
        // Pointers into a cycle stay pointers on every walk, so a resolved
        // document resolves to itself.
        if self.is_cyclic(&locator) {
            debug!(pointer, "cyclic schema reference left in place");
            return None;
        }
        if let Some(done) = self.resolved_schemas.get(&locator) {
            return Some(done.clone());
        }

        let Some(target) = self.schemas.get(&locator) else {
            self.report(ResolveError::SchemaNotFound {
                pointer: pointer.to_string(),
                locator,
            });
            return None;
        };

        Some(self.resolve_named_schema(pointer, &target))
    }

    /// Whether following schema pointers from `locator` leads back to it.
    fn is_cyclic(&mut self, locator: &str) -> bool {
        if let Some(&cyclic) = self.cyclic_schemas.get(locator) {
            return cyclic;
        }

        let mut seen = HashSet::new();
        let mut pending = vec![locator.to_string()];
        let mut cyclic = false;
        'search: while let Some(current) = pending.pop() {
            let Some(schema) = self.schemas.get(&current) else {
                continue;
            };
            for pointer in schema.pointers() {
                if Reference::new(pointer.as_str()).is_external() {
                    continue;
                }
                let next = schema_locator(&self.config.schema_authority, &pointer);
                if next == locator {
                    cyclic = true;
                    break 'search;
                }
                if seen.insert(next.clone()) {
                    pending.push(next);
                }
            }
        }

        self.cyclic_schemas.insert(locator.to_string(), cyclic);
        cyclic
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    fn at<R>(&mut self, segment: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment.into());
        let out = f(self);
        self.path.pop();
        out
    }

    fn at_all<R>(&mut self, segments: Vec<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.path.len();
        self.path.extend(segments);
        let out = f(self);
        self.path.truncate(depth);
        out
    }

    /// JSON pointer of the current holder.
    fn location(&self) -> String {
        let mut location = String::from("#");
        for segment in &self.path {
            location.push('/');
            location.push_str(&escape_segment(segment));
        }
        location
    }

    fn report(&mut self, error: ResolveError) {
        let diagnostic = Diagnostic {
            location: self.location(),
            error: error.with_host(self.host.as_deref()),
        };
        warn!(location = %diagnostic.location, "{}", diagnostic.error);
        self.diagnostics.push(diagnostic);
    }
}
