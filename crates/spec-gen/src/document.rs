//! OpenAPI document loading.

use crate::error::{Result, SpecGenError};
use openapiv3::OpenAPI;
use std::path::Path;

/// Load an OpenAPI document from a file, JSON or YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as an
/// OpenAPI document.
pub fn load(path: &Path) -> Result<OpenAPI> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecGenError::SpecRead {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

/// Parse an in-memory OpenAPI document.
///
/// JSON is a valid subset of YAML, so one YAML parse handles both formats.
///
/// # Errors
///
/// Returns [`SpecGenError::SpecParse`] when the content is not an OpenAPI
/// document.
pub fn parse(content: &str, location: &str) -> Result<OpenAPI> {
    serde_yaml::from_str(content).map_err(|source| SpecGenError::SpecParse {
        location: location.to_string(),
        source,
    })
}
