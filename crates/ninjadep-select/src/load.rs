//! Loading persisted dependency mappings.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use ninjadep_schemas::{DependencyMapping, MappingDocument};
use tracing::{debug, instrument};

use crate::error::SelectError;

/// Reads a mapping in either accepted shape from `input`.
///
/// # Errors
///
/// Returns [`SelectError::is_io`] if reading fails, or
/// [`SelectError::is_deserialization`] if the JSON matches neither shape.
pub fn read_mapping(mut input: impl Read) -> Result<DependencyMapping, SelectError> {
    let mut json = String::new();
    input.read_to_string(&mut json)?;
    let document: MappingDocument =
        serde_json::from_str(&json).map_err(SelectError::deserialization)?;

    if matches!(document, MappingDocument::Bare(_)) {
        debug!("mapping has no reverse index, deriving it");
    }
    Ok(document.into_mapping())
}

/// Loads a mapping from a file.
///
/// # Errors
///
/// Returns [`SelectError::is_mapping_read`] if the file cannot be opened or
/// read, or [`SelectError::is_deserialization`] if its contents are invalid.
#[instrument]
pub fn load_mapping(path: &Path) -> Result<DependencyMapping, SelectError> {
    let file = File::open(path).map_err(|e| SelectError::mapping_read(path, e))?;
    let mut json = String::new();
    BufReader::new(file)
        .read_to_string(&mut json)
        .map_err(|e| SelectError::mapping_read(path, e))?;
    read_mapping(json.as_bytes())
}
