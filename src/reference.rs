use serde::{Deserialize, Serialize};

use crate::resolution::ComponentCategory;

/// An immutable symbolic pointer, as written in a `$ref` field.
///
/// The raw text has the shape `<external-resource>#<fragment>`, where the
/// fragment is a JSON pointer into the target document, e.g.
/// `#/components/parameters/limit` or `common.json#/components/schemas/Error`.
/// Every accessor derives its answer from the raw text, so a descriptor never
/// changes once it is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pointer: String,
    /// Location of the document the reference was declared in.
    #[serde(skip)]
    host_document: Option<String>,
}

impl Reference {
    /// Creates a descriptor from raw `$ref` text.
    pub fn new(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            host_document: None,
        }
    }

    /// Creates a local reference to a named component, e.g.
    /// `#/components/parameters/limit`.
    pub fn component(category: ComponentCategory, identifier: &str) -> Self {
        if category == ComponentCategory::Tags {
            return Self::tag(identifier);
        }
        Self::new(format!(
            "#/components/{}/{}",
            category.as_str(),
            escape_segment(identifier)
        ))
    }

    /// Creates a local reference to a top-level tag by name.
    pub fn tag(name: &str) -> Self {
        Self::new(format!("#/tags/{}", escape_segment(name)))
    }

    /// Returns a copy of this descriptor carrying the declaring document.
    pub fn with_host(&self, host: impl Into<String>) -> Self {
        Self {
            pointer: self.pointer.clone(),
            host_document: Some(host.into()),
        }
    }

    /// The raw `$ref` text.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn host_document(&self) -> Option<&str> {
        self.host_document.as_deref()
    }

    /// The locator of the target document, or `None` for a local reference.
    pub fn external_resource(&self) -> Option<&str> {
        let resource = match self.pointer.split_once('#') {
            Some((resource, _)) => resource,
            None => self.pointer.as_str(),
        };
        if resource.is_empty() {
            None
        } else {
            Some(resource)
        }
    }

    /// Whether the reference targets another document entirely.
    pub fn is_external(&self) -> bool {
        self.external_resource().is_some()
    }

    /// The JSON pointer after `#`, empty when the reference has no fragment.
    pub fn fragment(&self) -> &str {
        self.pointer
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .unwrap_or("")
    }

    /// The component category named by the fragment, if it names one.
    ///
    /// `/components/<category>/<id>` yields `<category>`; `/tags/<name>`
    /// yields [`ComponentCategory::Tags`].
    pub fn category(&self) -> Option<ComponentCategory> {
        let segments = self.segments();
        match segments.first().copied()? {
            "components" => ComponentCategory::from_str(segments.get(1)?),
            "tags" => Some(ComponentCategory::Tags),
            _ => None,
        }
    }

    /// The key of the target within its category, unescaped.
    ///
    /// For `/components/<category>/<id>/...` and `/tags/<name>/...` this is
    /// the segment naming the component, however deep the pointer goes.
    /// Other pointers yield their last segment.
    pub fn identifier(&self) -> String {
        let segments = self.segments();
        let position = match segments.first().copied() {
            Some("components") => 2,
            Some("tags") => 1,
            _ => segments.len().saturating_sub(1),
        };
        unescape_segment(segments.get(position).copied().unwrap_or(""))
    }

    /// Whether the pointer reaches inside a component instead of naming it,
    /// e.g. `#/components/parameters/limit/schema`.
    pub fn is_nested(&self) -> bool {
        let segments = self.segments();
        match segments.first().copied() {
            Some("components") => segments.len() > 3,
            Some("tags") => segments.len() > 2,
            _ => false,
        }
    }

    fn segments(&self) -> Vec<&str> {
        let fragment = self.fragment();
        fragment
            .strip_prefix('/')
            .unwrap_or(fragment)
            .split('/')
            .collect()
    }
}

/// Escapes a single JSON pointer segment (RFC 6901).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape_segment`].
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
