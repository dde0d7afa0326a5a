//! Rust source emission.
//!
//! Renders extracted operations as a provider module in the same shape as
//! the hand-written provider crates: one constructor function per method and
//! a `methods()` registration list.

use crate::operations::{OperationSpec, ParamLocation, ParamSpec};
use serde_json::Value;
use std::fmt::Write;

/// Render the generated provider module.
///
/// Output is fully determined by the input operations and provider key; the
/// same document always renders byte-identical source.
#[must_use]
pub fn render_methods(operations: &[OperationSpec], provider: &str) -> String {
    let mut out = String::new();

    out.push_str("//! Generated method definitions.\n");
    out.push_str("//!\n");
    out.push_str("//! Derived from an OpenAPI document; regenerate instead of editing.\n\n");

    let uses_json = operations.iter().any(|op| {
        op.params
            .iter()
            .any(|p| p.default.is_some() || !p.allowed_values.is_empty())
    });
    out.push_str(
        "use scm_plugin_sdk::{ApiEndpoint, MethodMetadata, ParamKind, ParameterDefinition, PluginMethod};\n",
    );
    if uses_json {
        out.push_str("use serde_json::json;\n");
    }
    out.push('\n');

    let _ = writeln!(out, "const PROVIDER: &str = {};", literal(provider));
    out.push('\n');

    out.push_str("/// Registration list for the generated provider.\n");
    out.push_str("#[must_use]\n");
    out.push_str("pub fn methods() -> Vec<PluginMethod> {\n");
    out.push_str("    vec![\n");
    for op in operations {
        let _ = writeln!(out, "        {}(),", fn_name(&op.name));
    }
    out.push_str("    ]\n");
    out.push_str("}\n");

    for op in operations {
        out.push('\n');
        render_operation(&mut out, op);
    }

    out
}

fn render_operation(out: &mut String, op: &OperationSpec) {
    let _ = writeln!(out, "fn {}() -> PluginMethod {{", fn_name(&op.name));
    out.push_str("    PluginMethod::new(\n");

    let _ = writeln!(out, "        MethodMetadata::new(");
    let _ = writeln!(out, "            {},", literal(&op.name));
    let _ = writeln!(out, "            {},", literal(&op.title));
    let _ = writeln!(out, "            {},", literal(&op.description));
    out.push_str("        )");
    for param in &op.params {
        out.push_str("\n        .parameter(\n");
        render_parameter(out, param);
        out.push_str("\n        )");
    }
    out.push_str(",\n");

    let _ = writeln!(
        out,
        "        ApiEndpoint::new({}, {})",
        literal(op.verb),
        literal(&op.path)
    );
    out.push_str("            .provider(PROVIDER)");
    for param in &op.params {
        match param.location {
            ParamLocation::Query => {
                let _ = write!(
                    out,
                    "\n            .query_param({}, {})",
                    literal(&param.name),
                    literal(&param.wire_name)
                );
            }
            ParamLocation::Path if param.name != param.wire_name => {
                let _ = write!(
                    out,
                    "\n            .path_param({}, {})",
                    literal(&param.name),
                    literal(&param.wire_name)
                );
            }
            ParamLocation::Path | ParamLocation::Body => {}
        }
    }
    out.push_str(",\n");

    out.push_str("    )\n");
    out.push_str("}\n");
}

fn render_parameter(out: &mut String, param: &ParamSpec) {
    let _ = write!(
        out,
        "            ParameterDefinition::new({}, {})",
        literal(&param.name),
        param.ty.kind_token()
    );
    if param.required {
        out.push_str("\n                .required()");
    }
    if !param.description.is_empty() {
        let _ = write!(
            out,
            "\n                .description({})",
            literal(&param.description)
        );
    }
    if let Some(default) = &param.default {
        let _ = write!(out, "\n                .default_value({})", json_token(default));
    }
    if let Some(rule) = param.rule {
        let _ = write!(out, "\n                .pattern({})", literal(rule.pattern));
    }
    if !param.allowed_values.is_empty() {
        let values: Vec<String> = param.allowed_values.iter().map(json_token).collect();
        let _ = write!(
            out,
            "\n                .allowed_values([{}])",
            values.join(", ")
        );
    }
    out.push(',');
}

/// A valid Rust identifier for the constructor function.
fn fn_name(name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("op_{name}")
    } else {
        name.to_string()
    }
}

/// A `json!` invocation reproducing a JSON value.
fn json_token(value: &Value) -> String {
    format!("json!({value})")
}

/// A Rust string literal for arbitrary text.
fn literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
