//! Credential routing for outbound calls.
//!
//! The resolver inspects the target URL and selects the stored token for the
//! matching provider. Token values never appear in logs, `Debug` output, or
//! error messages.

use crate::error::{PluginError, Result};
use std::collections::BTreeMap;
use url::Url;

/// Provider key for GitHub tokens in the credential set.
pub const GITHUB_TOKEN_KEY: &str = "github_token";
/// Provider key for GitLab tokens in the credential set.
pub const GITLAB_TOKEN_KEY: &str = "gitlab_token";

/// One known provider: credential key, base URL, and the URL markers used to
/// recognize calls to it.
pub struct Provider {
    /// Endpoint provider key (`ApiEndpoint::provider`).
    pub key: &'static str,
    /// Credential set key.
    pub token_key: &'static str,
    /// Base URL prepended to relative endpoint paths.
    pub base_url: &'static str,
    /// Hostname substrings that identify the provider.
    host_markers: &'static [&'static str],
    /// Path prefixes that identify the provider (versioned API segments),
    /// useful for self-hosted instances on arbitrary hosts.
    path_markers: &'static [&'static str],
}

/// Known providers, in precedence order for URL matching.
pub const PROVIDERS: &[Provider] = &[
    Provider {
        key: "github",
        token_key: GITHUB_TOKEN_KEY,
        base_url: "https://api.github.com",
        host_markers: &["github"],
        path_markers: &[],
    },
    Provider {
        key: "gitlab",
        token_key: GITLAB_TOKEN_KEY,
        base_url: "https://gitlab.com/api/v4",
        host_markers: &["gitlab"],
        path_markers: &["/api/v4"],
    },
];

/// Base URL for a provider key, if known.
#[must_use]
pub fn base_url(provider: &str) -> Option<&'static str> {
    PROVIDERS.iter().find(|p| p.key == provider).map(|p| p.base_url)
}

/// Mapping from provider key to secret token value. Loaded from persisted
/// configuration; replaced wholesale by administrative updates, never
/// mutated by request execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    tokens: BTreeMap<String, String>,
}

impl CredentialSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, key: impl Into<String>, token: impl Into<String>) -> Self {
        self.insert(key, token);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(key.into(), token.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    /// Keys with a non-empty token value.
    fn configured(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// An `Authorization` header fragment produced by credential resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHeader {
    pub name: &'static str,
    pub value: String,
}

impl CredentialHeader {
    fn bearer(token: &str) -> Self {
        Self {
            name: "Authorization",
            value: format!("Bearer {token}"),
        }
    }
}

impl std::fmt::Debug for CredentialHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHeader")
            .field("name", &self.name)
            .field("value", &"Bearer ********")
            .finish()
    }
}

/// Select the credential that applies to a target URL.
///
/// Policy: a single configured credential applies unconditionally, so
/// single-provider deployments need no URL matching. Otherwise the URL is
/// matched against the provider table; an unmatched URL in a multi-provider
/// set resolves to no credential rather than guessing a default.
///
/// # Errors
///
/// Returns [`PluginError::NoCredential`] when the resolved provider's token
/// is absent or empty, or when no provider pattern matches the URL.
pub fn resolve(url: &Url, credentials: &CredentialSet) -> Result<CredentialHeader> {
    let configured = credentials.configured();

    if let [only] = configured.as_slice() {
        // Safe: `configured` only lists keys present in the map.
        return Ok(CredentialHeader::bearer(credentials.get(only).unwrap_or_default()));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = url.path();

    let matched = PROVIDERS.iter().find(|p| {
        p.host_markers.iter().any(|m| host.contains(m))
            || p.path_markers.iter().any(|m| path.starts_with(m) || path.contains(m))
    });

    let Some(provider) = matched else {
        return Err(PluginError::NoCredential {
            provider: host.clone(),
        });
    };

    match credentials.get(provider.token_key) {
        Some(token) if !token.is_empty() => Ok(CredentialHeader::bearer(token)),
        _ => Err(PluginError::NoCredential {
            provider: provider.key.to_string(),
        }),
    }
}
