//! Persisted runtime configuration.
//!
//! The on-disk shape round-trips exactly: fixed protocol keys at the top
//! level plus an `init_config` list of named sections, each holding a
//! `params` list of `{key, title, description, attr, value}` entries.
//! Secret entries feed the [`CredentialSet`]; the read path masks them.

use crate::credentials::CredentialSet;
use crate::error::{PluginError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mask used in place of secret values on the read path.
const SECRET_MASK: &str = "*****";

/// Top-level persisted configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub name: String,
    pub author: String,
    pub version: String,
    pub proto: String,
    pub schema_version: String,
    #[serde(default)]
    pub init_config: Vec<ConfigSection>,
}

/// One named section of configurable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSection {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<ConfigParam>,
}

/// One configurable parameter entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParam {
    pub attr: ParamAttr,
    pub key: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub value: Vec<Value>,
}

/// UI/validation attributes of a configurable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamAttr {
    pub input_type: String,
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub required: bool,
}

impl RuntimeConfig {
    /// The built-in default: GitHub and GitLab token entries under a single
    /// `global_configs` section.
    #[must_use]
    pub fn default_scm() -> Self {
        Self {
            name: "SCM Provider".to_string(),
            author: "Sam Soofy".to_string(),
            version: "v1.0.0".to_string(),
            proto: "v0.1.0".to_string(),
            schema_version: "srn-schema-v1".to_string(),
            init_config: vec![ConfigSection {
                name: "global_configs".to_string(),
                title: "SCM Provider Settings".to_string(),
                description: "Required parameters for SCM providers (GitHub & GitLab)".to_string(),
                params: vec![
                    ConfigParam {
                        attr: ParamAttr {
                            input_type: "string".to_string(),
                            secret: true,
                            required: true,
                        },
                        key: "github_token".to_string(),
                        title: "GitHub Personal Access Token".to_string(),
                        description: "Personal access token for GitHub API".to_string(),
                        placeholder: Some("e.g. ghp_XXXXXXXXXXXXXXXXXXXXXX".to_string()),
                        value: Vec::new(),
                    },
                    ConfigParam {
                        attr: ParamAttr {
                            input_type: "string".to_string(),
                            secret: true,
                            required: true,
                        },
                        key: "gitlab_token".to_string(),
                        title: "GitLab Personal Access Token".to_string(),
                        description: "Personal access token for GitLab API".to_string(),
                        placeholder: Some("e.g. glpat-XXXXXXXXXXXXXXXX".to_string()),
                        value: Vec::new(),
                    },
                ],
            }],
        }
    }

    fn protocol_keys_match(&self, other: &Self) -> bool {
        self.name == other.name
            && self.author == other.author
            && self.version == other.version
            && self.proto == other.proto
            && self.schema_version == other.schema_version
    }
}

/// Owner of the persisted configuration.
///
/// Readers take an [`Arc`] snapshot and therefore always see either the
/// entire old config or the entire new one; updates replace the whole `Arc`
/// after persisting. Request execution never mutates it.
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<RuntimeConfig>>,
}

impl ConfigStore {
    /// Load from `path` if the file exists, otherwise start from the
    /// built-in default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            RuntimeConfig::default_scm()
        };
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A store that never touches disk. Intended for embedding and tests.
    #[must_use]
    pub fn in_memory(config: RuntimeConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuntimeConfig> {
        self.current.read().clone()
    }

    /// Configuration for the read endpoint: secret values are masked, never
    /// echoed in plaintext. Empty values stay empty so consumers can tell
    /// "unset" from "set".
    #[must_use]
    pub fn redacted(&self) -> RuntimeConfig {
        let mut config = (*self.snapshot()).clone();
        for section in &mut config.init_config {
            for param in &mut section.params {
                if param.attr.secret && !param.value.is_empty() {
                    param.value = vec![Value::String(SECRET_MASK.to_string())];
                }
            }
        }
        config
    }

    /// Apply an administrative update.
    ///
    /// Protocol keys must be unchanged; the update may only add or replace
    /// entries inside `init_config`. Sections are merged by name and params
    /// by key, so a partial update leaves unmentioned entries in place. The
    /// merged config is persisted before the in-memory swap.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a protocol key differs, or an IO
    /// error if persisting fails (in which case the old config stays
    /// active).
    pub fn update(&self, incoming: RuntimeConfig) -> Result<()> {
        let current = self.snapshot();
        if !current.protocol_keys_match(&incoming) {
            return Err(PluginError::Config(
                "protocol keys (name, author, version, proto, schema_version) must not change"
                    .to_string(),
            ));
        }

        let mut merged = (*current).clone();
        for incoming_section in incoming.init_config {
            match merged
                .init_config
                .iter_mut()
                .find(|s| s.name == incoming_section.name)
            {
                Some(section) => {
                    for incoming_param in incoming_section.params {
                        match section.params.iter_mut().find(|p| p.key == incoming_param.key) {
                            Some(param) => *param = incoming_param,
                            None => section.params.push(incoming_param),
                        }
                    }
                }
                None => merged.init_config.push(incoming_section),
            }
        }

        if let Some(path) = &self.path {
            persist(path, &merged)?;
        }

        *self.current.write() = Arc::new(merged);
        tracing::info!("runtime configuration updated");
        Ok(())
    }

    /// Extract the credential set: every secret entry's first value, keyed
    /// by its config key.
    #[must_use]
    pub fn credential_set(&self) -> CredentialSet {
        let config = self.snapshot();
        let mut set = CredentialSet::new();
        for section in &config.init_config {
            for param in &section.params {
                if !param.attr.secret {
                    continue;
                }
                let token = param
                    .value
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                set.insert(param.key.clone(), token);
            }
        }
        set
    }
}

fn persist(path: &Path, config: &RuntimeConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{GITHUB_TOKEN_KEY, GITLAB_TOKEN_KEY};
    use serde_json::json;

    fn config_with_tokens(github: &str, gitlab: &str) -> RuntimeConfig {
        let mut config = RuntimeConfig::default_scm();
        config.init_config[0].params[0].value = vec![json!(github)];
        config.init_config[0].params[1].value = vec![json!(gitlab)];
        config
    }

    #[test]
    fn persisted_shape_round_trips_exactly() {
        let config = config_with_tokens("ghp_abc", "glpat-xyz");
        let first = serde_json::to_string_pretty(&config).expect("serialize");
        let parsed: RuntimeConfig = serde_json::from_str(&first).expect("parse");
        assert_eq!(parsed, config);
        let second = serde_json::to_string_pretty(&parsed).expect("serialize again");
        assert_eq!(first, second);
    }

    #[test]
    fn load_falls_back_to_default_when_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConfigStore::load(dir.path().join("missing.json")).expect("load");
        assert_eq!(store.snapshot().schema_version, "srn-schema-v1");
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plugin_runtime_config.json");

        let store = ConfigStore::load(&path).expect("load");
        store
            .update(config_with_tokens("ghp_abc", "glpat-xyz"))
            .expect("update");

        let reloaded = ConfigStore::load(&path).expect("reload");
        assert_eq!(
            reloaded.credential_set().get(GITHUB_TOKEN_KEY),
            Some("ghp_abc")
        );
    }

    #[test]
    fn update_rejects_protocol_key_changes() {
        let store = ConfigStore::in_memory(RuntimeConfig::default_scm());
        let mut incoming = RuntimeConfig::default_scm();
        incoming.version = "v9.9.9".to_string();
        let err = store.update(incoming).unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[test]
    fn update_merges_entries_instead_of_dropping_them() {
        let store = ConfigStore::in_memory(config_with_tokens("ghp_abc", "glpat-xyz"));

        let mut partial = RuntimeConfig::default_scm();
        partial.init_config[0].params.truncate(1);
        partial.init_config[0].params[0].value = vec![json!("ghp_new")];
        store.update(partial).expect("partial update");

        let creds = store.credential_set();
        assert_eq!(creds.get(GITHUB_TOKEN_KEY), Some("ghp_new"));
        assert_eq!(creds.get(GITLAB_TOKEN_KEY), Some("glpat-xyz"));
    }

    #[test]
    fn redacted_masks_secret_values() {
        let store = ConfigStore::in_memory(config_with_tokens("ghp_abc", ""));
        let redacted = store.redacted();
        let params = &redacted.init_config[0].params;
        assert_eq!(params[0].value, vec![json!("*****")]);
        // Unset secrets stay empty.
        assert!(params[1].value.is_empty());
        let text = serde_json::to_string(&redacted).expect("serialize");
        assert!(!text.contains("ghp_abc"));
    }

    #[test]
    fn snapshot_is_atomic_under_update() {
        let store = ConfigStore::in_memory(config_with_tokens("ghp_old", "glpat-old"));
        let before = store.snapshot();
        store
            .update(config_with_tokens("ghp_new", "glpat-new"))
            .expect("update");

        // The old snapshot is entirely old; a fresh snapshot entirely new.
        assert_eq!(before.init_config[0].params[0].value, vec![json!("ghp_old")]);
        assert_eq!(before.init_config[0].params[1].value, vec![json!("glpat-old")]);
        let after = store.snapshot();
        assert_eq!(after.init_config[0].params[0].value, vec![json!("ghp_new")]);
        assert_eq!(after.init_config[0].params[1].value, vec![json!("glpat-new")]);
    }
}
