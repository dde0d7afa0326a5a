//! Config descriptor artifacts.
//!
//! Two JSON artifacts accompany the generated source: a flat method list for
//! catalogue display, and per-method parameter descriptors in the persisted
//! configuration `params` entry shape.

use crate::operations::{OperationSpec, ParamSpec};
use serde_json::{Value, json};

/// The method list artifact: `[{method, title, description}]`.
#[must_use]
pub fn render_method_list(operations: &[OperationSpec]) -> Value {
    Value::Array(
        operations
            .iter()
            .map(|op| {
                json!({
                    "method": op.name,
                    "title": op.title,
                    "description": op.description,
                })
            })
            .collect(),
    )
}

/// The method config artifact: per-method parameter descriptors.
#[must_use]
pub fn render_method_configs(operations: &[OperationSpec]) -> Value {
    Value::Array(
        operations
            .iter()
            .map(|op| {
                let params: Vec<Value> = op.params.iter().map(param_descriptor).collect();
                json!({
                    "name": op.name,
                    "title": op.title,
                    "description": op.description,
                    "params": params,
                })
            })
            .collect(),
    )
}

fn param_descriptor(param: &ParamSpec) -> Value {
    let regex_pattern = param.rule.map_or(Value::Null, |rule| {
        json!({"pattern": rule.pattern, "message": rule.message})
    });
    let value = param
        .default
        .clone()
        .unwrap_or_else(|| param.ty.empty_default());
    let description = if param.description.is_empty() {
        format!("Parameter: {}", param.wire_name)
    } else {
        param.description.clone()
    };

    let mut descriptor = json!({
        "attr": {
            "regex_pattern": regex_pattern,
            "input_type": param.ty.input_type(),
            "secret": param.secret,
            "required": param.required,
        },
        "key": param.wire_name,
        "title": crate::operations::title_case(&param.name),
        "description": description,
        "placeholder": format!("Enter {}", param.name.replace('_', " ")),
        "value": value,
    });

    if !param.allowed_values.is_empty() {
        descriptor["options"] = Value::Array(
            param
                .allowed_values
                .iter()
                .map(|v| {
                    let s = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    json!({"value": s, "title": crate::operations::title_case(&s)})
                })
                .collect(),
        );
    }

    descriptor
}
