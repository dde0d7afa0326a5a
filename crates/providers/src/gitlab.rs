//! GitLab REST API methods.
//!
//! GitLab addresses projects by numeric ID rather than owner/name pairs, and
//! its issue states are `opened`/`closed` rather than GitHub's `open`.

use scm_plugin_sdk::{ApiEndpoint, MethodMetadata, ParamKind, ParameterDefinition, PluginMethod};
use serde_json::json;

const ACCEPT_JSON: &str = "application/json";

/// Registration list for the GitLab provider.
#[must_use]
pub fn methods() -> Vec<PluginMethod> {
    vec![
        list_projects(),
        get_project(),
        create_issue(),
        list_issues(),
        list_branches(),
    ]
}

fn list_projects() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "gitlab_list_projects",
            "List GitLab Projects",
            "List projects the authenticated user has access to",
        )
        .parameter(
            ParameterDefinition::new("membership", ParamKind::Boolean)
                .description("Limit to projects the current user is a member of")
                .default_value(json!(true)),
        ),
        ApiEndpoint::new("GET", "/projects")
            .provider("gitlab")
            .header("Accept", ACCEPT_JSON)
            .query_param("membership", "membership"),
    )
}

fn get_project() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "gitlab_get_project",
            "Get GitLab Project",
            "Get details of a GitLab project",
        )
        .parameter(
            ParameterDefinition::new("project_id", ParamKind::Integer)
                .required()
                .description("ID of the project"),
        ),
        ApiEndpoint::new("GET", "/projects/{project_id}")
            .provider("gitlab")
            .header("Accept", ACCEPT_JSON),
    )
}

fn create_issue() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "gitlab_create_issue",
            "Create GitLab Issue",
            "Create an issue in a GitLab project",
        )
        .parameter(
            ParameterDefinition::new("project_id", ParamKind::Integer)
                .required()
                .description("ID of the project"),
        )
        .parameter(
            ParameterDefinition::new("title", ParamKind::String)
                .required()
                .description("Issue title"),
        )
        .parameter(
            ParameterDefinition::new("description", ParamKind::String)
                .description("Issue description"),
        ),
        ApiEndpoint::new("POST", "/projects/{project_id}/issues")
            .provider("gitlab")
            .header("Accept", ACCEPT_JSON),
    )
}

fn list_issues() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "gitlab_list_issues",
            "List GitLab Issues",
            "List issues in a GitLab project",
        )
        .parameter(
            ParameterDefinition::new("project_id", ParamKind::Integer)
                .required()
                .description("ID of the project"),
        )
        .parameter(
            ParameterDefinition::new("state", ParamKind::String)
                .description("Issue state (opened, closed, all)")
                .default_value(json!("opened"))
                .allowed_values([json!("opened"), json!("closed"), json!("all")]),
        ),
        ApiEndpoint::new("GET", "/projects/{project_id}/issues")
            .provider("gitlab")
            .header("Accept", ACCEPT_JSON)
            .query_param("state", "state"),
    )
}

fn list_branches() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "gitlab_list_branches",
            "List GitLab Branches",
            "List branches of a GitLab project",
        )
        .parameter(
            ParameterDefinition::new("project_id", ParamKind::Integer)
                .required()
                .description("ID of the project"),
        ),
        ApiEndpoint::new("GET", "/projects/{project_id}/repository/branches")
            .provider("gitlab")
            .header("Accept", ACCEPT_JSON),
    )
}
