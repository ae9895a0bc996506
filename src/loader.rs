use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{ApiRefError, Result};
use crate::types::Document;

/// Reads and parses a JSON API description from disk.
///
/// The returned document remembers its path, which later shows up on the
/// diagnostics of references declared in it.
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path).map_err(|e| ApiRefError::File {
        message: e.to_string(),
        path: path.display().to_string(),
    })?;
    parse_document(&contents, Some(&path.display().to_string()))
}

/// Parses a JSON API description. `location` names the source for error
/// messages and diagnostics.
pub fn parse_document(source: &str, location: Option<&str>) -> Result<Document> {
    let mut document: Document = serde_json::from_str(source).map_err(|e| ApiRefError::Parse {
        message: e.to_string(),
        path: location.unwrap_or("<inline>").to_string(),
    })?;
    document.location = location.map(str::to_string);

    debug!(
        location = location.unwrap_or("<inline>"),
        paths = document.paths.len(),
        "parsed document"
    );
    Ok(document)
}
