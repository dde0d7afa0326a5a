//! Operation extraction.
//!
//! Flattens an OpenAPI document into the generator's intermediate model:
//! one [`OperationSpec`] per path/verb pair, each with its parameters routed
//! to path, query, or body. Constructs the method model cannot express are
//! flattened best-effort and reported as [`GenerationWarning`]s.

use crate::error::GenerationWarning;
use openapiv3::{
    OpenAPI, Operation, Parameter, ParameterSchemaOrContent, PathItem, ReferenceOr, RequestBody,
    Schema, SchemaKind, Type, VariantOrUnknownOrEmpty,
};
use serde_json::Value;

/// Where a parameter is routed in the materialized request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

/// Parameter type in the generated definition, carrying the array item
/// distinction the config descriptors need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    StringArray,
    NumberArray,
    Object,
}

impl ParamType {
    /// Token for the generated Rust source.
    #[must_use]
    pub fn kind_token(self) -> &'static str {
        match self {
            ParamType::String => "ParamKind::String",
            ParamType::Integer => "ParamKind::Integer",
            ParamType::Boolean => "ParamKind::Boolean",
            ParamType::StringArray | ParamType::NumberArray => "ParamKind::Array",
            ParamType::Object => "ParamKind::Object",
        }
    }

    /// `input_type` value in the config descriptor artifacts.
    #[must_use]
    pub fn input_type(self) -> &'static str {
        match self {
            ParamType::Integer => "number",
            ParamType::Boolean => "boolean",
            ParamType::StringArray => "string[]",
            ParamType::NumberArray => "number[]",
            ParamType::String | ParamType::Object => "string",
        }
    }

    /// Placeholder value in config descriptors when the schema has no
    /// default.
    #[must_use]
    pub fn empty_default(self) -> Value {
        match self {
            ParamType::Integer => Value::from(0),
            ParamType::Boolean => Value::from(false),
            ParamType::StringArray | ParamType::NumberArray => Value::Array(Vec::new()),
            ParamType::String | ParamType::Object => Value::from(""),
        }
    }
}

/// Validation regex derived from an OpenAPI type/format pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRule {
    pub pattern: &'static str,
    pub message: &'static str,
}

/// One extracted parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// snake_case name in the generated definition.
    pub name: String,
    /// Name on the wire (path placeholder, query key, or body field).
    pub wire_name: String,
    pub location: ParamLocation,
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
    pub default: Option<Value>,
    pub rule: Option<PatternRule>,
    pub allowed_values: Vec<Value>,
    /// `format: password` body fields are marked secret in descriptors.
    pub secret: bool,
}

/// One extracted operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    /// snake_case method name, from `operationId` or a verb+path slug.
    pub name: String,
    pub title: String,
    pub description: String,
    pub verb: &'static str,
    pub path: String,
    pub params: Vec<ParamSpec>,
}

/// Flatten a document into operation specs plus warnings. Document order is
/// preserved; verbs within one path item follow a fixed order so the output
/// is deterministic.
#[must_use]
pub fn extract(spec: &OpenAPI) -> (Vec<OperationSpec>, Vec<GenerationWarning>) {
    let mut operations = Vec::new();
    let mut warnings = Vec::new();

    for (path, item) in &spec.paths.paths {
        let item = match item {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                warnings.push(GenerationWarning::new(
                    path.clone(),
                    format!("path item is an unresolved reference '{reference}' and was skipped"),
                ));
                continue;
            }
        };

        for (verb, operation) in verbs(item) {
            let Some(operation) = operation else {
                continue;
            };
            operations.push(extract_operation(path, verb, item, operation, &mut warnings));
        }
    }

    (operations, warnings)
}

fn verbs(item: &PathItem) -> [(&'static str, Option<&Operation>); 5] {
    [
        ("GET", item.get.as_ref()),
        ("POST", item.post.as_ref()),
        ("PUT", item.put.as_ref()),
        ("PATCH", item.patch.as_ref()),
        ("DELETE", item.delete.as_ref()),
    ]
}

fn extract_operation(
    path: &str,
    verb: &'static str,
    item: &PathItem,
    operation: &Operation,
    warnings: &mut Vec<GenerationWarning>,
) -> OperationSpec {
    let name = operation
        .operation_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map_or_else(|| slug_from_path(verb, path), to_snake_case);

    let description = operation
        .description
        .clone()
        .or_else(|| operation.summary.clone())
        .unwrap_or_else(|| format!("{verb} {path}"));

    let mut params = Vec::new();

    // Path-item parameters apply to every operation; operation parameters
    // are appended after, matching declaration order.
    for parameter in item.parameters.iter().chain(&operation.parameters) {
        extract_parameter(&name, parameter, &mut params, warnings);
    }

    if body_capable(verb) {
        if let Some(request_body) = &operation.request_body {
            extract_body(&name, request_body, &mut params, warnings);
        }
    } else if operation.request_body.is_some() {
        warnings.push(GenerationWarning::new(
            name.clone(),
            format!("request body on a {verb} operation is not supported and was skipped"),
        ));
    }

    OperationSpec {
        title: title_case(&name),
        name,
        description,
        verb,
        path: path.to_string(),
        params,
    }
}

fn body_capable(verb: &str) -> bool {
    matches!(verb, "POST" | "PUT" | "PATCH" | "DELETE")
}

fn extract_parameter(
    operation: &str,
    parameter: &ReferenceOr<Parameter>,
    params: &mut Vec<ParamSpec>,
    warnings: &mut Vec<GenerationWarning>,
) {
    let parameter = match parameter {
        ReferenceOr::Item(parameter) => parameter,
        ReferenceOr::Reference { reference } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!("parameter reference '{reference}' was not resolved and was skipped"),
            ));
            return;
        }
    };

    let (location, data) = match parameter {
        Parameter::Path { parameter_data, .. } => (ParamLocation::Path, parameter_data),
        Parameter::Query { parameter_data, .. } => (ParamLocation::Query, parameter_data),
        Parameter::Header { parameter_data, .. } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!(
                    "header parameter '{}' is not supported and was skipped",
                    parameter_data.name
                ),
            ));
            return;
        }
        Parameter::Cookie { parameter_data, .. } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!(
                    "cookie parameter '{}' is not supported and was skipped",
                    parameter_data.name
                ),
            ));
            return;
        }
    };

    let schema = match &data.format {
        ParameterSchemaOrContent::Schema(schema) => {
            resolve_schema(operation, &data.name, schema, warnings)
        }
        ParameterSchemaOrContent::Content(_) => {
            warnings.push(GenerationWarning::new(
                operation,
                format!(
                    "content-typed parameter '{}' was flattened to a string",
                    data.name
                ),
            ));
            None
        }
    };

    let classified = classify(operation, &data.name, schema, warnings);

    params.push(ParamSpec {
        name: to_snake_case(&data.name),
        wire_name: data.name.clone(),
        location,
        ty: classified.ty,
        // Path parameters are always required on the wire.
        required: data.required || location == ParamLocation::Path,
        description: data.description.clone().unwrap_or_default(),
        default: classified.default,
        rule: classified.rule,
        allowed_values: classified.allowed_values,
        secret: false,
    });
}

fn extract_body(
    operation: &str,
    request_body: &ReferenceOr<RequestBody>,
    params: &mut Vec<ParamSpec>,
    warnings: &mut Vec<GenerationWarning>,
) {
    let request_body = match request_body {
        ReferenceOr::Item(body) => body,
        ReferenceOr::Reference { reference } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!("request body reference '{reference}' was not resolved and was skipped"),
            ));
            return;
        }
    };

    let Some(media) = request_body
        .content
        .get("application/json")
        .or_else(|| request_body.content.get("application/x-www-form-urlencoded"))
    else {
        let types: Vec<&str> = request_body.content.keys().map(String::as_str).collect();
        warnings.push(GenerationWarning::new(
            operation,
            format!(
                "request body content types [{}] are not supported and were skipped",
                types.join(", ")
            ),
        ));
        return;
    };

    let Some(schema) = media
        .schema
        .as_ref()
        .and_then(|s| resolve_schema(operation, "request body", s, warnings))
    else {
        return;
    };

    let SchemaKind::Type(Type::Object(object)) = &schema.schema_kind else {
        warnings.push(GenerationWarning::new(
            operation,
            "request body schema is not a flat object and was flattened to an object parameter",
        ));
        params.push(ParamSpec {
            name: "body".to_string(),
            wire_name: "body".to_string(),
            location: ParamLocation::Body,
            ty: ParamType::Object,
            required: request_body.required,
            description: request_body.description.clone().unwrap_or_default(),
            default: None,
            rule: None,
            allowed_values: Vec::new(),
            secret: false,
        });
        return;
    };

    for (property, prop_schema) in &object.properties {
        let schema = resolve_schema(operation, property, prop_schema, warnings);
        let classified = classify(operation, property, schema, warnings);
        let secret = schema.is_some_and(is_password_format);

        params.push(ParamSpec {
            name: to_snake_case(property),
            wire_name: property.clone(),
            location: ParamLocation::Body,
            ty: classified.ty,
            required: object.required.contains(property),
            description: schema
                .and_then(|s| s.schema_data.description.clone())
                .unwrap_or_default(),
            default: classified.default,
            rule: classified.rule,
            allowed_values: classified.allowed_values,
            secret,
        });
    }
}

fn resolve_schema<'a, S: std::borrow::Borrow<Schema>>(
    operation: &str,
    name: &str,
    schema: &'a ReferenceOr<S>,
    warnings: &mut Vec<GenerationWarning>,
) -> Option<&'a Schema> {
    match schema {
        ReferenceOr::Item(schema) => Some(schema.borrow()),
        ReferenceOr::Reference { reference } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!(
                    "schema reference '{reference}' for '{name}' was not resolved; treated as a string"
                ),
            ));
            None
        }
    }
}

struct Classified {
    ty: ParamType,
    default: Option<Value>,
    rule: Option<PatternRule>,
    allowed_values: Vec<Value>,
}

/// Map an OpenAPI schema to the closed parameter type set, deriving
/// validation rules from type/format and allowed values from enumerations.
fn classify(
    operation: &str,
    name: &str,
    schema: Option<&Schema>,
    warnings: &mut Vec<GenerationWarning>,
) -> Classified {
    let Some(schema) = schema else {
        return Classified {
            ty: ParamType::String,
            default: None,
            rule: None,
            allowed_values: Vec::new(),
        };
    };
    let default = schema.schema_data.default.clone();

    match &schema.schema_kind {
        SchemaKind::Type(Type::String(s)) => {
            let rule = match &s.format {
                VariantOrUnknownOrEmpty::Item(openapiv3::StringFormat::Date) => Some(PatternRule {
                    pattern: r"^\d{4}-\d{2}-\d{2}$",
                    message: "Must be a valid date (YYYY-MM-DD)",
                }),
                VariantOrUnknownOrEmpty::Item(openapiv3::StringFormat::DateTime) => {
                    Some(PatternRule {
                        pattern: r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}",
                        message: "Must be a valid date-time",
                    })
                }
                VariantOrUnknownOrEmpty::Unknown(format) if format == "uuid" => Some(PatternRule {
                    pattern: "^[a-fA-F0-9-]{36}$",
                    message: "Must be a valid UUID",
                }),
                VariantOrUnknownOrEmpty::Unknown(format) if format == "email" => {
                    Some(PatternRule {
                        pattern: r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
                        message: "Must be a valid email address",
                    })
                }
                _ => None,
            };
            let allowed_values = s
                .enumeration
                .iter()
                .flatten()
                .map(|v| Value::String(v.clone()))
                .collect();
            Classified {
                ty: ParamType::String,
                default,
                rule,
                allowed_values,
            }
        }
        SchemaKind::Type(Type::Integer(i)) => Classified {
            ty: ParamType::Integer,
            default,
            rule: Some(PatternRule {
                pattern: "^[0-9]+$",
                message: "Must be a number",
            }),
            allowed_values: i.enumeration.iter().flatten().map(|v| Value::from(*v)).collect(),
        },
        SchemaKind::Type(Type::Number(n)) => Classified {
            ty: ParamType::Integer,
            default,
            rule: None,
            allowed_values: n.enumeration.iter().flatten().map(|v| Value::from(*v)).collect(),
        },
        SchemaKind::Type(Type::Boolean(_)) => Classified {
            ty: ParamType::Boolean,
            default,
            rule: None,
            allowed_values: Vec::new(),
        },
        SchemaKind::Type(Type::Array(a)) => {
            let numeric = a.items.as_ref().is_some_and(|items| {
                matches!(
                    items,
                    ReferenceOr::Item(item)
                        if matches!(
                            item.schema_kind,
                            SchemaKind::Type(Type::Integer(_)) | SchemaKind::Type(Type::Number(_))
                        )
                )
            });
            Classified {
                ty: if numeric {
                    ParamType::NumberArray
                } else {
                    ParamType::StringArray
                },
                default,
                rule: None,
                allowed_values: Vec::new(),
            }
        }
        SchemaKind::Type(Type::Object(_)) => Classified {
            ty: ParamType::Object,
            default,
            rule: None,
            allowed_values: Vec::new(),
        },
        SchemaKind::OneOf { .. } | SchemaKind::AllOf { .. } | SchemaKind::AnyOf { .. } => {
            warnings.push(GenerationWarning::new(
                operation,
                format!("composite schema (oneOf/allOf/anyOf) for '{name}' was flattened to an object"),
            ));
            Classified {
                ty: ParamType::Object,
                default,
                rule: None,
                allowed_values: Vec::new(),
            }
        }
        SchemaKind::Not { .. } | SchemaKind::Any(_) => {
            warnings.push(GenerationWarning::new(
                operation,
                format!("untyped schema for '{name}' was flattened to an object"),
            ));
            Classified {
                ty: ParamType::Object,
                default,
                rule: None,
                allowed_values: Vec::new(),
            }
        }
    }
}

fn is_password_format(schema: &Schema) -> bool {
    matches!(
        &schema.schema_kind,
        SchemaKind::Type(Type::String(s))
            if matches!(s.format, VariantOrUnknownOrEmpty::Item(openapiv3::StringFormat::Password))
    )
}

/// Deterministic method name for operations without an `operationId`:
/// the verb plus the path segments, placeholders unbraced.
fn slug_from_path(verb: &str, path: &str) -> String {
    let mut slug = verb.to_ascii_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        slug.push('_');
        slug.push_str(&to_snake_case(segment.trim_matches(['{', '}'])));
    }
    slug
}

/// camelCase/PascalCase/kebab-case to snake_case.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let boundary = i.checked_sub(1).is_some_and(|j| {
                let prev = chars[j];
                prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase()
                        && chars.get(i + 1).is_some_and(char::is_ascii_lowercase))
            });
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// snake_case to a Title Case display string.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.split('_')
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use serde_json::json;

    fn spec(yaml: &str) -> OpenAPI {
        document::parse(yaml, "inline").expect("test document")
    }

    #[test]
    fn snake_case_handles_camel_pascal_and_kebab() {
        assert_eq!(to_snake_case("listRepoIssues"), "list_repo_issues");
        assert_eq!(to_snake_case("ListRepoIssues"), "list_repo_issues");
        assert_eq!(to_snake_case("list-repo-issues"), "list_repo_issues");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn slug_is_derived_when_operation_id_is_missing() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /repos/{owner}/issues:
    get:
      responses: {}
",
        );
        let (ops, warnings) = extract(&spec);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "get_repos_owner_issues");
        assert_eq!(ops[0].title, "Get Repos Owner Issues");
        assert!(warnings.is_empty());
    }

    #[test]
    fn query_enum_and_default_are_extracted() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /issues:
    get:
      operationId: listIssues
      parameters:
        - name: state
          in: query
          schema:
            type: string
            default: open
            enum: [open, closed, all]
      responses: {}
",
        );
        let (ops, _) = extract(&spec);
        let state = &ops[0].params[0];
        assert_eq!(state.name, "state");
        assert_eq!(state.location, ParamLocation::Query);
        assert_eq!(state.default, Some(json!("open")));
        assert_eq!(
            state.allowed_values,
            vec![json!("open"), json!("closed"), json!("all")]
        );
    }

    #[test]
    fn integer_path_parameter_gets_a_digit_pattern_and_is_required() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /projects/{projectId}:
    get:
      operationId: getProject
      parameters:
        - name: projectId
          in: path
          required: true
          schema: {type: integer}
      responses: {}
",
        );
        let (ops, _) = extract(&spec);
        let param = &ops[0].params[0];
        assert_eq!(param.name, "project_id");
        assert_eq!(param.wire_name, "projectId");
        assert_eq!(param.ty, ParamType::Integer);
        assert!(param.required);
        assert_eq!(param.rule.map(|r| r.pattern), Some("^[0-9]+$"));
    }

    #[test]
    fn body_properties_become_body_params_with_password_secrets() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /users:
    post:
      operationId: createUser
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [login]
              properties:
                login: {type: string}
                password: {type: string, format: password}
      responses: {}
",
        );
        let (ops, warnings) = extract(&spec);
        assert!(warnings.is_empty());
        let params = &ops[0].params;
        assert_eq!(params.len(), 2);
        assert!(params[0].required && !params[0].secret);
        assert!(!params[1].required && params[1].secret);
        assert_eq!(params[1].location, ParamLocation::Body);
    }

    #[test]
    fn unsupported_constructs_are_warned_not_dropped_silently() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /things:
    get:
      operationId: listThings
      parameters:
        - name: session
          in: cookie
          schema: {type: string}
      responses: {}
    post:
      operationId: createThing
      requestBody:
        content:
          application/json:
            schema:
              oneOf:
                - {type: string}
                - {type: object}
      responses: {}
",
        );
        let (ops, warnings) = extract(&spec);
        assert_eq!(ops.len(), 2);
        assert!(warnings.iter().any(|w| w.detail.contains("cookie parameter")));
        assert!(warnings.iter().any(|w| w.detail.contains("not a flat object")
            || w.detail.contains("oneOf")));
        // The composite body still materializes as an object parameter.
        assert_eq!(ops[1].params[0].ty, ParamType::Object);
    }

    #[test]
    fn uuid_email_and_date_formats_map_to_patterns() {
        let spec = spec(
            r"
openapi: 3.0.3
info: {title: t, version: '1'}
paths:
  /audit:
    get:
      operationId: audit
      parameters:
        - {name: id, in: query, schema: {type: string, format: uuid}}
        - {name: contact, in: query, schema: {type: string, format: email}}
        - {name: day, in: query, schema: {type: string, format: date}}
      responses: {}
",
        );
        let (ops, _) = extract(&spec);
        let rules: Vec<&str> = ops[0]
            .params
            .iter()
            .map(|p| p.rule.map(|r| r.message).unwrap_or_default())
            .collect();
        assert_eq!(
            rules,
            vec![
                "Must be a valid UUID",
                "Must be a valid email address",
                "Must be a valid date (YYYY-MM-DD)"
            ]
        );
    }
}
