//! Parameter validation and coercion.
//!
//! The coercion rules live here and nowhere else: loose coercion is allowed
//! for primitive kinds (numeric strings for integers, `"true"`/`"false"`/0/1
//! for booleans), arrays and objects must arrive as their JSON shape.
//! Unknown extra parameters are rejected rather than silently ignored.

use crate::error::{PluginError, Result};
use crate::method::{ParamKind, ParameterDefinition};
use regex::Regex;
use serde_json::{Map, Value};

/// Validate caller-supplied parameters against a definition list.
///
/// Returns the validated map with coerced values; defaults are applied for
/// absent optional parameters only. A required parameter is never satisfied
/// by its default.
///
/// # Errors
///
/// Returns [`PluginError::Validation`] naming the parameter and the violated
/// constraint: unknown extras, missing required values, type mismatches,
/// pattern or allowed-value violations.
pub fn validate_params(
    definitions: &[ParameterDefinition],
    supplied: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    for key in supplied.keys() {
        if !definitions.iter().any(|d| d.name == *key) {
            return Err(PluginError::Validation {
                param: key.clone(),
                reason: "unknown parameter".to_string(),
            });
        }
    }

    let mut validated = Map::new();

    for def in definitions {
        let value = match supplied.get(&def.name) {
            Some(Value::Null) | None => {
                if def.required {
                    return Err(PluginError::Validation {
                        param: def.name.clone(),
                        reason: "missing required parameter".to_string(),
                    });
                }
                match &def.default {
                    Some(default) => default.clone(),
                    None => continue,
                }
            }
            Some(value) => value.clone(),
        };

        let coerced = coerce(def.kind, value).map_err(|reason| PluginError::Validation {
            param: def.name.clone(),
            reason,
        })?;

        check_constraints(def, &coerced)?;
        validated.insert(def.name.clone(), coerced);
    }

    Ok(validated)
}

/// Coerce a JSON value to the declared kind, or explain why it cannot be.
fn coerce(kind: ParamKind, value: Value) -> std::result::Result<Value, String> {
    match kind {
        ParamKind::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(format!("expected a string, got {}", kind_of(&other))),
        },
        ParamKind::Integer => match value {
            Value::Number(ref n) if n.is_i64() || n.is_u64() => Ok(value),
            Value::Number(_) => Err("expected an integer, got a fractional number".to_string()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected an integer, got '{s}'")),
            other => Err(format!("expected an integer, got {}", kind_of(&other))),
        },
        ParamKind::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::Number(ref n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
            Value::Number(ref n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a boolean, got '{s}'")),
            },
            other => Err(format!("expected a boolean, got {}", kind_of(&other))),
        },
        ParamKind::Array => match value {
            Value::Array(_) => Ok(value),
            other => Err(format!("expected an array, got {}", kind_of(&other))),
        },
        ParamKind::Object => match value {
            Value::Object(_) => Ok(value),
            other => Err(format!("expected an object, got {}", kind_of(&other))),
        },
    }
}

fn check_constraints(def: &ParameterDefinition, value: &Value) -> Result<()> {
    if let Some(pattern) = &def.pattern {
        // Patterns were compiled once at registration; a failure here means
        // the definition bypassed `PluginMethod::validate`.
        let re = Regex::new(pattern).map_err(|e| PluginError::Config(format!(
            "Invalid pattern for parameter '{}': {e}",
            def.name
        )))?;
        let text = value_to_string(value);
        if !re.is_match(&text) {
            return Err(PluginError::Validation {
                param: def.name.clone(),
                reason: format!("value '{text}' does not match pattern '{pattern}'"),
            });
        }
    }

    if !def.allowed_values.is_empty() {
        let allowed = def
            .allowed_values
            .iter()
            .any(|a| a == value || value_to_string(a) == value_to_string(value));
        if !allowed {
            return Err(PluginError::Validation {
                param: def.name.clone(),
                reason: format!(
                    "value '{}' is not one of the allowed values",
                    value_to_string(value)
                ),
            });
        }
    }

    Ok(())
}

/// Scalar string form used for path/query substitution and pattern checks.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
