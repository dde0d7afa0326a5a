//! Error and warning types for the generator.

use thiserror::Error;

/// Main error type for generation.
#[derive(Error, Debug)]
pub enum SpecGenError {
    #[error("Failed to read OpenAPI document '{path}': {source}")]
    SpecRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse OpenAPI document from '{location}': {source}")]
    SpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parses but declares no usable operations.
    #[error("No operations found in the OpenAPI document")]
    NoOperations,

    /// IO errors (artifact output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors (artifact serialization).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, SpecGenError>;

/// A non-fatal generation problem: a construct the generator cannot express
/// exactly and has flattened or skipped. Warnings are collected and reported
/// to the caller, never silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    /// The operation (method name or `VERB path`) the construct belongs to.
    pub operation: String,
    pub detail: String,
}

impl GenerationWarning {
    pub fn new(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.operation, self.detail)
    }
}
