use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A shared, immutable schema node.
///
/// Resolution never edits a node; it builds a replacement and swaps the
/// holder's `Rc`.
pub type Schema = Rc<SchemaNode>;

/// One node of the embedded schema sub-language.
///
/// The composition keywords the resolver descends into are typed fields;
/// every other keyword (`type`, `format`, `enum`, ...) is kept verbatim in
/// `keywords`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Schema>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Schema>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(flatten)]
    pub keywords: IndexMap<String, Value>,
}

/// `additionalProperties` is either a boolean switch or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Schema),
}

impl SchemaNode {
    /// A pure pointer node: `{"$ref": pointer}`.
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self {
            reference: Some(pointer.into()),
            ..Self::default()
        }
    }

    /// A node with a single `type` keyword.
    pub fn typed(type_name: &str) -> Self {
        let mut keywords = IndexMap::new();
        keywords.insert("type".to_string(), Value::String(type_name.to_string()));
        Self {
            keywords,
            ..Self::default()
        }
    }

    /// Sets one free-form keyword.
    pub fn with_keyword(mut self, name: &str, value: Value) -> Self {
        self.keywords.insert(name.to_string(), value);
        self
    }

    pub fn with_property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn with_items(mut self, schema: Schema) -> Self {
        self.items = Some(schema);
        self
    }

    /// Whether this node is a pointer that the resolver must replace.
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Snapshot of the sub-schemas the resolver descends into.
    pub fn children(&self) -> SchemaChildren {
        SchemaChildren {
            items: self.items.clone(),
            all_of: self.all_of.clone(),
            any_of: self.any_of.clone(),
            one_of: self.one_of.clone(),
            not: self.not.clone(),
            properties: self.properties.clone(),
            additional_properties: match &self.additional_properties {
                Some(AdditionalProperties::Schema(schema)) => Some(schema.clone()),
                _ => None,
            },
        }
    }

    /// Builds a new node from this one with the given children swapped in.
    ///
    /// Non-composition keywords are carried over unchanged.
    pub fn rebuild(&self, children: SchemaChildren) -> SchemaNode {
        let additional_properties = match (&self.additional_properties, children.additional_properties)
        {
            (Some(AdditionalProperties::Schema(_)), Some(schema)) => {
                Some(AdditionalProperties::Schema(schema))
            }
            (other, _) => other.clone(),
        };
        SchemaNode {
            reference: self.reference.clone(),
            items: children.items,
            all_of: children.all_of,
            any_of: children.any_of,
            one_of: children.one_of,
            not: children.not,
            properties: children.properties,
            additional_properties,
            keywords: self.keywords.clone(),
        }
    }

    /// Applies `f` to every child and rebuilds the node.
    ///
    /// Returns `None` when `f` handed back the identical `Rc` for every
    /// child, so callers can keep the original node and its identity.
    pub fn map_children<F>(&self, mut f: F) -> Option<SchemaNode>
    where
        F: FnMut(SchemaSlot<'_>, &Schema) -> Schema,
    {
        let before = self.children();
        let after = SchemaChildren {
            items: before.items.as_ref().map(|s| f(SchemaSlot::Items, s)),
            not: before.not.as_ref().map(|s| f(SchemaSlot::Not, s)),
            additional_properties: before
                .additional_properties
                .as_ref()
                .map(|s| f(SchemaSlot::AdditionalProperties, s)),
            all_of: map_list(&before.all_of, SchemaSlot::AllOf, &mut f),
            any_of: map_list(&before.any_of, SchemaSlot::AnyOf, &mut f),
            one_of: map_list(&before.one_of, SchemaSlot::OneOf, &mut f),
            properties: before
                .properties
                .iter()
                .map(|(name, s)| (name.clone(), f(SchemaSlot::Property(name), s)))
                .collect(),
        };

        if before.same_as(&after) {
            None
        } else {
            Some(self.rebuild(after))
        }
    }
}

impl SchemaNode {
    /// Calls `f` for every child, in the order `map_children` visits them.
    pub fn for_each_child<F>(&self, mut f: F)
    where
        F: FnMut(SchemaSlot<'_>, &Schema),
    {
        self.map_children(|slot, child| {
            f(slot, child);
            child.clone()
        });
    }

    /// Every `$ref` in this node's subtree, this node's own first.
    pub fn pointers(&self) -> Vec<String> {
        let mut pointers = Vec::new();
        self.collect_pointers(&mut pointers);
        pointers
    }

    fn collect_pointers(&self, pointers: &mut Vec<String>) {
        if let Some(pointer) = &self.reference {
            pointers.push(pointer.clone());
        }
        self.for_each_child(|_, child| child.collect_pointers(pointers));
    }
}

fn map_list<F>(list: &[Schema], slot: fn(usize) -> SchemaSlot<'static>, f: &mut F) -> Vec<Schema>
where
    F: FnMut(SchemaSlot<'_>, &Schema) -> Schema,
{
    list.iter()
        .enumerate()
        .map(|(i, s)| f(slot(i), s))
        .collect()
}

/// Position of a child inside its parent schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSlot<'a> {
    Items,
    Not,
    AdditionalProperties,
    AllOf(usize),
    AnyOf(usize),
    OneOf(usize),
    Property(&'a str),
}

impl SchemaSlot<'_> {
    /// JSON pointer segments leading from the parent to this child.
    pub fn segments(&self) -> Vec<String> {
        match self {
            SchemaSlot::Items => vec!["items".to_string()],
            SchemaSlot::Not => vec!["not".to_string()],
            SchemaSlot::AdditionalProperties => vec!["additionalProperties".to_string()],
            SchemaSlot::AllOf(i) => vec!["allOf".to_string(), i.to_string()],
            SchemaSlot::AnyOf(i) => vec!["anyOf".to_string(), i.to_string()],
            SchemaSlot::OneOf(i) => vec!["oneOf".to_string(), i.to_string()],
            SchemaSlot::Property(name) => vec!["properties".to_string(), name.to_string()],
        }
    }
}

/// The recursive part of a [`SchemaNode`], collected before a rebuild.
#[derive(Debug, Clone, Default)]
pub struct SchemaChildren {
    pub items: Option<Schema>,
    pub all_of: Vec<Schema>,
    pub any_of: Vec<Schema>,
    pub one_of: Vec<Schema>,
    pub not: Option<Schema>,
    pub properties: IndexMap<String, Schema>,
    pub additional_properties: Option<Schema>,
}

impl SchemaChildren {
    /// Identity comparison: true when every slot holds the same `Rc`.
    fn same_as(&self, other: &SchemaChildren) -> bool {
        fn same_opt(a: &Option<Schema>, b: &Option<Schema>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        fn same_list(a: &[Schema], b: &[Schema]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| Rc::ptr_eq(a, b))
        }

        same_opt(&self.items, &other.items)
            && same_opt(&self.not, &other.not)
            && same_opt(&self.additional_properties, &other.additional_properties)
            && same_list(&self.all_of, &other.all_of)
            && same_list(&self.any_of, &other.any_of)
            && same_list(&self.one_of, &other.one_of)
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .values()
                .zip(other.properties.values())
                .all(|(a, b)| Rc::ptr_eq(a, b))
    }
}
