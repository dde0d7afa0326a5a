//! Declarative method definitions.
//!
//! A [`PluginMethod`] is the immutable aggregate of one [`MethodMetadata`]
//! (name, title, parameter schema) and one [`ApiEndpoint`] (verb, path
//! template, parameter routing). Definitions are plain values: providers
//! export registration lists of them and the registry indexes them at
//! startup.

use crate::error::{PluginError, Result};
use reqwest::Method;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Closed set of parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }
}

/// Definition of one method parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Default for optional parameters. A required parameter is never
    /// satisfied by its default: absence is a validation error.
    #[serde(default)]
    pub default: Option<Value>,
    /// Optional validation regex, matched against the coerced string form.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Optional closed set of allowed values.
    #[serde(default)]
    pub allowed_values: Vec<Value>,
}

impl ParameterDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: String::new(),
            default: None,
            pattern: None,
            allowed_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn allowed_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed_values = values.into_iter().collect();
        self
    }
}

/// Metadata for a plugin method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodMetadata {
    /// Globally unique, stable identifier used in routing. Uniqueness is
    /// enforced at registration, not here.
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

impl MethodMetadata {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Definition of the external API endpoint a method forwards to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// Provider key (`github`, `gitlab`) used for base-URL lookup. When
    /// absent, `path` must be an absolute URL.
    #[serde(default)]
    pub provider: Option<String>,
    /// Path template; placeholders like `{owner}` are substituted from
    /// validated parameter values.
    pub path: String,
    /// HTTP verb; parsed and validated at registration.
    pub method: String,
    /// Static headers, sent with every call. A credential header replaces a
    /// static header on exact key match.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Parameter name -> query-string key.
    #[serde(default)]
    pub query_param_mapping: BTreeMap<String, String>,
    /// Parameter name -> path placeholder, for parameters whose name differs
    /// from the placeholder. Placeholders default to the parameter name.
    #[serde(default)]
    pub path_param_mapping: BTreeMap<String, String>,
}

impl ApiEndpoint {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            provider: None,
            path: path.into(),
            method: method.into(),
            headers: Vec::new(),
            query_param_mapping: BTreeMap::new(),
            path_param_mapping: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query_param(mut self, param: impl Into<String>, key: impl Into<String>) -> Self {
        self.query_param_mapping.insert(param.into(), key.into());
        self
    }

    #[must_use]
    pub fn path_param(mut self, param: impl Into<String>, placeholder: impl Into<String>) -> Self {
        self.path_param_mapping.insert(param.into(), placeholder.into());
        self
    }
}

/// One callable method: metadata plus endpoint. Immutable once constructed;
/// owned by the registry after discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMethod {
    pub metadata: MethodMetadata,
    pub endpoint: ApiEndpoint,
}

impl PluginMethod {
    #[must_use]
    pub fn new(metadata: MethodMetadata, endpoint: ApiEndpoint) -> Self {
        Self { metadata, endpoint }
    }

    /// Registration-time validation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the verb or a header name is
    /// invalid, a validation pattern does not compile, or a path placeholder
    /// or query mapping references an undeclared parameter.
    pub fn validate(&self) -> Result<()> {
        let name = &self.metadata.name;

        self.endpoint
            .method
            .trim()
            .to_uppercase()
            .parse::<Method>()
            .map_err(|_| {
                PluginError::Config(format!(
                    "Invalid HTTP method '{}' in method '{name}'",
                    self.endpoint.method
                ))
            })?;

        for (header, _) in &self.endpoint.headers {
            HeaderName::try_from(header.as_str()).map_err(|_| {
                PluginError::Config(format!(
                    "Invalid header name '{header}' in method '{name}'"
                ))
            })?;
        }

        for param in &self.metadata.parameters {
            if let Some(pattern) = &param.pattern {
                regex::Regex::new(pattern).map_err(|e| {
                    PluginError::Config(format!(
                        "Invalid pattern for parameter '{}' in method '{name}': {e}",
                        param.name
                    ))
                })?;
            }
        }

        let declared: Vec<&str> = self
            .metadata
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        for placeholder in path_placeholders(&self.endpoint.path) {
            let covered = declared.contains(&placeholder.as_str())
                || self
                    .endpoint
                    .path_param_mapping
                    .iter()
                    .any(|(param, ph)| *ph == placeholder && declared.contains(&param.as_str()));
            if !covered {
                return Err(PluginError::Config(format!(
                    "Path placeholder '{{{placeholder}}}' in method '{name}' does not name a declared parameter"
                )));
            }
        }

        for param in self.endpoint.query_param_mapping.keys() {
            if !declared.contains(&param.as_str()) {
                return Err(PluginError::Config(format!(
                    "Query mapping for '{param}' in method '{name}' does not name a declared parameter"
                )));
            }
        }

        for param in self.endpoint.path_param_mapping.keys() {
            if !declared.contains(&param.as_str()) {
                return Err(PluginError::Config(format!(
                    "Path mapping for '{param}' in method '{name}' does not name a declared parameter"
                )));
            }
        }

        // GET has no body: parameters routed to neither path nor query are
        // dropped at request build time.
        if self.endpoint.method.eq_ignore_ascii_case("get") {
            for param in &self.metadata.parameters {
                if !self.is_path_param(&param.name) && !self.is_query_param(&param.name) {
                    tracing::warn!(
                        method = %name,
                        param = %param.name,
                        "parameter of a GET method is neither path- nor query-mapped and will be dropped"
                    );
                }
            }
        }

        Ok(())
    }

    /// The parsed HTTP verb. Call [`Self::validate`] first; falls back to GET
    /// for verbs that do not parse.
    #[must_use]
    pub fn verb(&self) -> Method {
        self.endpoint
            .method
            .trim()
            .to_uppercase()
            .parse()
            .unwrap_or(Method::GET)
    }

    /// Whether the verb carries a request body.
    #[must_use]
    pub fn body_capable(&self) -> bool {
        let verb = self.verb();
        verb == Method::POST || verb == Method::PUT || verb == Method::PATCH || verb == Method::DELETE
    }

    pub(crate) fn is_path_param(&self, param: &str) -> bool {
        let placeholder = self
            .endpoint
            .path_param_mapping
            .get(param)
            .map_or(param, String::as_str);
        path_placeholders(&self.endpoint.path)
            .iter()
            .any(|p| p == placeholder)
    }

    pub(crate) fn is_query_param(&self, param: &str) -> bool {
        self.endpoint.query_param_mapping.contains_key(param)
    }

    /// Full method configuration for introspection/UI consumers.
    #[must_use]
    pub fn config_descriptor(&self) -> Value {
        let params: Vec<Value> = self
            .metadata
            .parameters
            .iter()
            .map(|p| {
                let mut entry = json!({
                    "attr": {
                        "input_type": p.kind.as_str(),
                        "required": p.required,
                        "regex_pattern": p.pattern,
                        "secret": false,
                    },
                    "key": p.name,
                    "title": title_case(&p.name),
                    "description": p.description,
                    "placeholder": format!("Enter {}", p.name.replace('_', " ")),
                    "value": p.default.as_ref().map_or_else(Vec::new, |d| vec![d.clone()]),
                });
                if !p.allowed_values.is_empty() {
                    entry["options"] = Value::Array(
                        p.allowed_values
                            .iter()
                            .map(|v| {
                                let s = match v {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                };
                                json!({"value": s, "title": title_case(&s)})
                            })
                            .collect(),
                    );
                }
                entry
            })
            .collect();

        json!({
            "name": self.metadata.name,
            "title": self.metadata.title,
            "description": self.metadata.description,
            "params": params,
        })
    }
}

/// Extract `{placeholder}` names from a path template, in order.
#[must_use]
pub fn path_placeholders(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        out.push(rest[start + 1..start + end].to_string());
        rest = &rest[start + end + 1..];
    }
    out
}

fn title_case(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
