use std::fmt;

use serde::Serialize;

use crate::errors::ResolveError;

/// A reference that could not be resolved, and where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// JSON pointer of the holder inside the walked document,
    /// e.g. `#/paths/~1pets/get/parameters/0`.
    pub location: String,
    pub error: ResolveError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Append-only collection of diagnostics produced by one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics whose failing pointer names `identifier`.
    pub fn for_identifier<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| match d.error.reference() {
            Some(reference) => reference.identifier() == identifier,
            None => d.error.pointer().rsplit('/').next() == Some(identifier),
        })
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
