use serde::Serialize;
use thiserror::Error;

use crate::reference::Reference;
use crate::resolution::ComponentCategory;

/// Errors that can occur while loading documents or configuration.
#[derive(Error, Debug)]
pub enum ApiRefError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `ApiRefError`.
pub type Result<T> = std::result::Result<T, ApiRefError>;

/// Reasons a single reference could not be resolved during a walk.
///
/// These never abort a walk; the resolver converts each one into a
/// [`Diagnostic`](crate::resolution::Diagnostic) and moves on.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    #[error("no {category} component named '{}' ({})", .reference.identifier(), .reference.pointer())]
    NotFound {
        category: ComponentCategory,
        reference: Reference,
    },

    #[error("expected a reference to {expected}, found '{}'", .reference.pointer())]
    CategoryMismatch {
        expected: ComponentCategory,
        reference: Reference,
    },

    #[error("external reference '{}' is not resolved", .reference.pointer())]
    ExternalUnsupported { reference: Reference },

    #[error("schema '{pointer}' is not registered (locator: {locator})")]
    SchemaNotFound { pointer: String, locator: String },

    #[error("external schema reference '{pointer}' is not resolved")]
    ExternalSchema { pointer: String },
}

impl ResolveError {
    /// Returns the raw pointer text of the reference that failed.
    pub fn pointer(&self) -> &str {
        match self {
            Self::NotFound { reference, .. }
            | Self::CategoryMismatch { reference, .. }
            | Self::ExternalUnsupported { reference } => reference.pointer(),
            Self::SchemaNotFound { pointer, .. } | Self::ExternalSchema { pointer } => pointer,
        }
    }

    /// Returns the reference descriptor, when the failure came from a
    /// component reference rather than a schema pointer.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Self::NotFound { reference, .. }
            | Self::CategoryMismatch { reference, .. }
            | Self::ExternalUnsupported { reference } => Some(reference),
            Self::SchemaNotFound { .. } | Self::ExternalSchema { .. } => None,
        }
    }

    /// Stamps the declaring document onto the carried descriptor.
    pub(crate) fn with_host(self, host: Option<&str>) -> Self {
        let Some(host) = host else { return self };
        match self {
            Self::NotFound {
                category,
                reference,
            } => Self::NotFound {
                category,
                reference: reference.with_host(host),
            },
            Self::CategoryMismatch {
                expected,
                reference,
            } => Self::CategoryMismatch {
                expected,
                reference: reference.with_host(host),
            },
            Self::ExternalUnsupported { reference } => Self::ExternalUnsupported {
                reference: reference.with_host(host),
            },
            other => other,
        }
    }
}
