//! Offline generator: OpenAPI document -> SCM plugin method definitions.
//!
//! Given an OpenAPI document, produces a provider module in the style of the
//! hand-written provider crates plus two JSON descriptor artifacts (method
//! list and per-method parameter configs). Generation is pure: the same
//! document always produces byte-identical output, and constructs the method
//! model cannot express come back as warnings rather than disappearing.

pub mod codegen;
pub mod configs;
pub mod document;
pub mod error;
pub mod operations;

use error::{GenerationWarning, Result, SpecGenError};
use openapiv3::OpenAPI;
use serde_json::Value;
use std::path::Path;

pub use error::SpecGenError as Error;

/// All generation outputs for one document.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Rust source for the provider module (`methods.rs`).
    pub methods_source: String,
    /// Method list artifact (`methods_list.json`).
    pub methods_list: Value,
    /// Method config artifact (`methods_configs.json`).
    pub methods_configs: Value,
    pub warnings: Vec<GenerationWarning>,
}

/// Run generation over a parsed document.
///
/// `provider` is the provider key the generated endpoints carry, used for
/// base-URL lookup and credential routing at runtime.
///
/// # Errors
///
/// Returns [`SpecGenError::NoOperations`] when the document declares no
/// usable operations.
pub fn generate(spec: &OpenAPI, provider: &str) -> Result<Generated> {
    let (operations, warnings) = operations::extract(spec);
    if operations.is_empty() {
        return Err(SpecGenError::NoOperations);
    }

    for warning in &warnings {
        tracing::warn!(operation = %warning.operation, detail = %warning.detail, "generation warning");
    }

    Ok(Generated {
        methods_source: codegen::render_methods(&operations, provider),
        methods_list: configs::render_method_list(&operations),
        methods_configs: configs::render_method_configs(&operations),
        warnings,
    })
}

/// Write the three artifacts into `out_dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written.
pub fn write_artifacts(generated: &Generated, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    std::fs::write(out_dir.join("methods.rs"), &generated.methods_source)?;

    let list = serde_json::to_string_pretty(&generated.methods_list)?;
    std::fs::write(out_dir.join("methods_list.json"), list + "\n")?;

    let configs = serde_json::to_string_pretty(&generated.methods_configs)?;
    std::fs::write(out_dir.join("methods_configs.json"), configs + "\n")?;

    Ok(())
}
