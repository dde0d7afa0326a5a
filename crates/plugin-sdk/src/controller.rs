//! Request execution.
//!
//! The controller owns the only path from a method invocation to the network:
//! look up the definition, validate parameters, materialize the endpoint,
//! resolve a credential, make exactly one bounded HTTP call, and hand the
//! upstream response back verbatim. There are no retries and no response
//! reshaping; upstream error statuses are data, not transport failures.

use crate::config::ConfigStore;
use crate::credentials::{self, CredentialHeader};
use crate::error::{PluginError, Result};
use crate::method::{PluginMethod, path_placeholders};
use crate::params::{validate_params, value_to_string};
use crate::registry::SharedRegistry;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default bound on one outbound call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one executed method call: the upstream status and body, passed
/// through without reinterpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResponse {
    pub status: u16,
    pub body: Value,
}

/// Executes plugin methods against their upstream APIs.
#[derive(Clone)]
pub struct Controller {
    registry: SharedRegistry,
    config: Arc<ConfigStore>,
    client: reqwest::Client,
    timeout: Duration,
}

impl Controller {
    #[must_use]
    pub fn new(registry: SharedRegistry, config: Arc<ConfigStore>) -> Self {
        Self {
            registry,
            config,
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registry handle, for list/introspection endpoints.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Configuration store handle.
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Execute one method call.
    ///
    /// Validation runs to completion before any network activity: a request
    /// that fails validation produces no outbound traffic. Exactly one HTTP
    /// call is made; timeouts and connection failures surface as
    /// [`PluginError::UpstreamUnavailable`] and are never retried.
    ///
    /// # Errors
    ///
    /// [`PluginError::NotFound`] for unknown method names,
    /// [`PluginError::Validation`] for parameter violations,
    /// [`PluginError::NoCredential`] when resolution finds no usable token,
    /// [`PluginError::UpstreamUnavailable`] for transport failures.
    pub async fn execute(&self, name: &str, args: Map<String, Value>) -> Result<MethodResponse> {
        let registry = self.registry.snapshot();
        let Some(method) = registry.get(name) else {
            return Err(PluginError::NotFound {
                method: name.to_string(),
            });
        };

        let validated = validate_params(&method.metadata.parameters, &args)?;
        let parts = build_request_parts(method, &validated)?;

        let credentials = self.config.credential_set();
        let credential = credentials::resolve(&parts.url, &credentials)?;

        let headers = build_headers(method, &credential)?;

        tracing::debug!(
            method = %name,
            verb = %method.verb(),
            url = %redact_url(&parts.url),
            "dispatching upstream call"
        );

        let mut request = self
            .client
            .request(method.verb(), parts.url.clone())
            .headers(headers)
            .timeout(self.timeout);
        if let Some(body) = &parts.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PluginError::UpstreamUnavailable(sanitize_reqwest_error(&e)))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PluginError::UpstreamUnavailable(sanitize_reqwest_error(&e)))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(MethodResponse { status, body })
    }
}

/// Materialized endpoint: full URL (path and query applied) plus an optional
/// JSON body.
#[derive(Debug, Clone)]
pub(crate) struct RequestParts {
    pub url: Url,
    pub body: Option<Value>,
}

/// Build the concrete URL and body for one validated invocation.
///
/// Routing is positional by declaration: each validated parameter is a path
/// parameter if it fills a placeholder, a query parameter if the endpoint
/// maps it, otherwise a body field on body-capable verbs. GET drops unmapped
/// parameters (flagged at registration) rather than inventing a body.
pub(crate) fn build_request_parts(
    method: &PluginMethod,
    validated: &Map<String, Value>,
) -> Result<RequestParts> {
    let endpoint = &method.endpoint;

    let mut path = endpoint.path.clone();
    for placeholder in path_placeholders(&endpoint.path) {
        let param = endpoint
            .path_param_mapping
            .iter()
            .find(|(_, ph)| **ph == placeholder)
            .map_or(placeholder.as_str(), |(p, _)| p.as_str());
        let Some(value) = validated.get(param) else {
            // Placeholder coverage is checked at registration; an optional
            // path parameter without a value cannot be materialized.
            return Err(PluginError::Validation {
                param: param.to_string(),
                reason: format!("no value for path placeholder '{{{placeholder}}}'"),
            });
        };
        let encoded = encode_path_segment(&value_to_string(value));
        path = path.replace(&format!("{{{placeholder}}}"), &encoded);
    }

    let mut url = resolve_url(endpoint.provider.as_deref(), &path, &method.metadata.name)?;

    {
        let mut pairs = url.query_pairs_mut();
        for (param, key) in &endpoint.query_param_mapping {
            if let Some(value) = validated.get(param) {
                pairs.append_pair(key, &value_to_string(value));
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }

    let body = if method.body_capable() {
        let mut body = Map::new();
        for (param, value) in validated {
            if !method.is_path_param(param) && !method.is_query_param(param) {
                body.insert(param.clone(), value.clone());
            }
        }
        if body.is_empty() {
            None
        } else {
            Some(Value::Object(body))
        }
    } else {
        None
    };

    Ok(RequestParts { url, body })
}

fn resolve_url(provider: Option<&str>, path: &str, method_name: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path)
            .map_err(|e| PluginError::Config(format!("Invalid URL in method '{method_name}': {e}")));
    }

    let Some(provider) = provider else {
        return Err(PluginError::Config(format!(
            "Method '{method_name}' has a relative path but no provider for base-URL lookup"
        )));
    };
    let Some(base) = credentials::base_url(provider) else {
        return Err(PluginError::Config(format!(
            "Unknown provider '{provider}' in method '{method_name}'"
        )));
    };

    // Base URLs may carry a path prefix (`/api/v4`); keep it.
    let full = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&full)
        .map_err(|e| PluginError::Config(format!("Invalid URL in method '{method_name}': {e}")))
}

fn build_headers(method: &PluginMethod, credential: &CredentialHeader) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &method.endpoint.headers {
        let name = HeaderName::try_from(name.as_str()).map_err(|_| {
            PluginError::Config(format!("Invalid header name '{name}'"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            PluginError::Config(format!("Invalid header value for '{name}'"))
        })?;
        headers.insert(name, value);
    }

    let name = HeaderName::try_from(credential.name)
        .map_err(|_| PluginError::Config("Invalid credential header name".to_string()))?;
    let mut value = HeaderValue::from_str(&credential.value)
        .map_err(|_| PluginError::Config("Credential value is not a valid header".to_string()))?;
    value.set_sensitive(true);
    // Last write wins: a resolved credential replaces any static header of
    // the same name.
    headers.insert(name, value);

    Ok(headers)
}

/// Percent-encode one path segment value. Unreserved characters pass through,
/// everything else (including `/`) is escaped so a value cannot splice extra
/// path segments into the template.
fn encode_path_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

/// URL form safe for logs and error messages: query and userinfo stripped.
fn redact_url(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    let _ = clean.set_username("");
    let _ = clean.set_password(None);
    clean.to_string()
}

/// Reduce a transport error to a short, secret-free description. `reqwest`
/// errors can embed the full request URL; only the redacted form survives.
fn sanitize_reqwest_error(err: &reqwest::Error) -> String {
    let target = err
        .url()
        .map(|u| format!(" for {}", redact_url(u)))
        .unwrap_or_default();
    if err.is_timeout() {
        format!("request timed out{target}")
    } else if err.is_connect() {
        format!("connection failed{target}")
    } else if err.is_request() {
        format!("request could not be sent{target}")
    } else if err.is_body() || err.is_decode() {
        format!("response body could not be read{target}")
    } else {
        format!("transport error{target}")
    }
}
