//! Error types for the SCM plugin runtime.

use thiserror::Error;

/// Main error type for the plugin runtime.
///
/// `DuplicateMethodName` is a startup-only condition: discovery refuses to
/// build a registry containing it, so traffic is never served over a
/// conflicting catalogue.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Unknown method name. A client error; never retried.
    #[error("Method not found: {method}")]
    NotFound { method: String },

    /// Parameter validation failure, naming the parameter and the violated
    /// constraint. No outbound call is made when this is returned.
    #[error("Invalid parameter '{param}': {reason}")]
    Validation { param: String, reason: String },

    /// No usable credential for the resolved provider. A configuration
    /// error, distinct from an upstream 401/403 response.
    #[error("No credential configured for provider '{provider}'")]
    NoCredential { provider: String },

    /// Transport-level failure reaching the upstream API (timeout, refused
    /// connection, DNS). Distinct from a received-but-erroring response,
    /// which passes through verbatim.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Two discovered definitions share a method name. Fatal at startup.
    #[error("Duplicate method name: {name}")]
    DuplicateMethodName { name: String },

    /// Configuration errors (invalid definitions, protocol key changes).
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors (config persistence).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors (config persistence).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for plugin runtime operations.
pub type Result<T> = std::result::Result<T, PluginError>;
