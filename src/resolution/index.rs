use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::ResolveError;
use crate::reference::Reference;
use crate::types::*;

/// Categories of named, referenceable objects in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentCategory {
    Tags,
    Parameters,
    RequestBodies,
    Responses,
    Examples,
    Headers,
    Links,
    Callbacks,
    PathItems,
    SecuritySchemes,
    Schemas,
}

#[allow(clippy::should_implement_trait)]
impl ComponentCategory {
    /// Returns the key used for this category under `components`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentCategory::Tags => "tags",
            ComponentCategory::Parameters => "parameters",
            ComponentCategory::RequestBodies => "requestBodies",
            ComponentCategory::Responses => "responses",
            ComponentCategory::Examples => "examples",
            ComponentCategory::Headers => "headers",
            ComponentCategory::Links => "links",
            ComponentCategory::Callbacks => "callbacks",
            ComponentCategory::PathItems => "pathItems",
            ComponentCategory::SecuritySchemes => "securitySchemes",
            ComponentCategory::Schemas => "schemas",
        }
    }

    /// Parses a category key, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<ComponentCategory> {
        match s {
            "tags" => Some(ComponentCategory::Tags),
            "parameters" => Some(ComponentCategory::Parameters),
            "requestBodies" => Some(ComponentCategory::RequestBodies),
            "responses" => Some(ComponentCategory::Responses),
            "examples" => Some(ComponentCategory::Examples),
            "headers" => Some(ComponentCategory::Headers),
            "links" => Some(ComponentCategory::Links),
            "callbacks" => Some(ComponentCategory::Callbacks),
            "pathItems" => Some(ComponentCategory::PathItems),
            "securitySchemes" => Some(ComponentCategory::SecuritySchemes),
            "schemas" => Some(ComponentCategory::Schemas),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live registered object of any referenceable kind.
#[derive(Debug, Clone)]
pub enum Entity {
    Tag(Shared<Tag>),
    Parameter(Shared<Parameter>),
    RequestBody(Shared<RequestBody>),
    Response(Shared<Response>),
    Example(Shared<Example>),
    Header(Shared<Header>),
    Link(Shared<Link>),
    Callback(Shared<Callback>),
    PathItem(Shared<PathItem>),
    SecurityScheme(Shared<SecurityScheme>),
}

impl Entity {
    pub fn category(&self) -> ComponentCategory {
        match self {
            Entity::Tag(_) => ComponentCategory::Tags,
            Entity::Parameter(_) => ComponentCategory::Parameters,
            Entity::RequestBody(_) => ComponentCategory::RequestBodies,
            Entity::Response(_) => ComponentCategory::Responses,
            Entity::Example(_) => ComponentCategory::Examples,
            Entity::Header(_) => ComponentCategory::Headers,
            Entity::Link(_) => ComponentCategory::Links,
            Entity::Callback(_) => ComponentCategory::Callbacks,
            Entity::PathItem(_) => ComponentCategory::PathItems,
            Entity::SecurityScheme(_) => ComponentCategory::SecuritySchemes,
        }
    }
}

/// Entity kinds that can stand behind a [`RefOr`] edge.
pub trait Referenceable: Sized {
    /// The category this kind is registered under.
    const CATEGORY: ComponentCategory;

    fn into_entity(shared: Shared<Self>) -> Entity;

    fn from_entity(entity: Entity) -> Option<Shared<Self>>;
}

macro_rules! referenceable {
    ($($ty:ident => $category:ident),* $(,)?) => {
        $(
            impl Referenceable for $ty {
                const CATEGORY: ComponentCategory = ComponentCategory::$category;

                fn into_entity(shared: Shared<Self>) -> Entity {
                    Entity::$ty(shared)
                }

                fn from_entity(entity: Entity) -> Option<Shared<Self>> {
                    match entity {
                        Entity::$ty(shared) => Some(shared),
                        _ => None,
                    }
                }
            }
        )*
    };
}

referenceable! {
    Tag => Tags,
    Parameter => Parameters,
    RequestBody => RequestBodies,
    Response => Responses,
    Example => Examples,
    Header => Headers,
    Link => Links,
    Callback => Callbacks,
    PathItem => PathItems,
    SecurityScheme => SecuritySchemes,
}

/// The document's lookup table of registered components, keyed by
/// `(category, identifier)`.
///
/// Entries are populated before a walk and only read during it. Lookups hand
/// back the registered `Rc` itself, never a copy.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: HashMap<(ComponentCategory, String), Entity>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from the components and top-level tags of `document`.
    ///
    /// A component entry that is itself a local reference (an alias such as
    /// `parameters.max: {$ref: '#/components/parameters/limit'}`) is
    /// registered under the object its chain ends at. Chains that loop or
    /// end outside the document are left out.
    pub fn from_document(document: &Document) -> Self {
        let mut index = Self::new();

        for tag in &document.tags {
            if let Some(shared) = tag.target() {
                let name = shared.borrow().name.clone();
                index.register(&name, shared.clone());
            }
        }

        if let Some(components) = &document.components {
            index.register_all(&components.parameters);
            index.register_all(&components.request_bodies);
            index.register_all(&components.responses);
            index.register_all(&components.examples);
            index.register_all(&components.headers);
            index.register_all(&components.links);
            index.register_all(&components.callbacks);
            index.register_all(&components.path_items);
            index.register_all(&components.security_schemes);
        }

        index
    }

    /// Registers `shared` under its kind's category. A later registration
    /// for the same identifier replaces the earlier one.
    pub fn register<T: Referenceable>(&mut self, identifier: &str, shared: Shared<T>) {
        self.entries
            .insert((T::CATEGORY, identifier.to_string()), T::into_entity(shared));
    }

    fn register_all<T: Referenceable>(&mut self, entries: &IndexMap<String, RefOr<T>>) {
        let mut aliases = Vec::new();
        for (identifier, entry) in entries {
            match entry {
                RefOr::Item(shared) | RefOr::Resolved { target: shared, .. } => {
                    self.register(identifier, shared.clone())
                }
                RefOr::Ref(reference) if !reference.is_external() => {
                    aliases.push((identifier, reference))
                }
                RefOr::Ref(_) => {}
            }
        }

        // Each pass settles at least one more link of every alias chain.
        while !aliases.is_empty() {
            let pending = aliases.len();
            aliases.retain(|(identifier, reference)| match self.resolve::<T>(reference) {
                Ok(shared) => {
                    self.register(identifier, shared);
                    false
                }
                Err(_) => true,
            });
            if aliases.len() == pending {
                break;
            }
        }
    }

    /// Looks up the entity registered for `reference` under `category`.
    ///
    /// Fails with `CategoryMismatch` when the pointer itself names another
    /// category, and with `NotFound` when nothing is registered or the
    /// pointer reaches inside a component.
    pub fn resolve_entity(
        &self,
        category: ComponentCategory,
        reference: &Reference,
    ) -> Result<Entity, ResolveError> {
        if let Some(named) = reference.category() {
            if named != category {
                return Err(ResolveError::CategoryMismatch {
                    expected: category,
                    reference: reference.clone(),
                });
            }
        }
        if reference.is_nested() {
            return Err(ResolveError::NotFound {
                category,
                reference: reference.clone(),
            });
        }

        self.entries
            .get(&(category, reference.identifier()))
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                category,
                reference: reference.clone(),
            })
    }

    /// Typed form of [`resolve_entity`](Self::resolve_entity).
    pub fn resolve<T: Referenceable>(&self, reference: &Reference) -> Result<Shared<T>, ResolveError> {
        let entity = self.resolve_entity(T::CATEGORY, reference)?;
        T::from_entity(entity).ok_or_else(|| ResolveError::NotFound {
            category: T::CATEGORY,
            reference: reference.clone(),
        })
    }

    /// Whether `shared` is the object registered for `identifier`.
    pub fn is_registered<T: Referenceable>(&self, identifier: &str, shared: &Shared<T>) -> bool {
        self.entries
            .get(&(T::CATEGORY, identifier.to_string()))
            .cloned()
            .and_then(T::from_entity)
            .is_some_and(|registered| Rc::ptr_eq(&registered, shared))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
