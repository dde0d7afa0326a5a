//! GitHub REST API methods.

use scm_plugin_sdk::{ApiEndpoint, MethodMetadata, ParamKind, ParameterDefinition, PluginMethod};
use serde_json::json;

const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";

/// Registration list for the GitHub provider.
#[must_use]
pub fn methods() -> Vec<PluginMethod> {
    vec![
        list_repositories(),
        get_repository(),
        create_issue(),
        list_issues(),
        list_branches(),
    ]
}

fn list_repositories() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "github_list_repositories",
            "List GitHub Repositories",
            "List repositories for the authenticated user",
        ),
        ApiEndpoint::new("GET", "/user/repos")
            .provider("github")
            .header("Accept", ACCEPT_GITHUB_V3),
    )
}

fn get_repository() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "github_get_repository",
            "Get GitHub Repository",
            "Get details of a GitHub repository",
        )
        .parameter(
            ParameterDefinition::new("owner", ParamKind::String)
                .required()
                .description("Owner of the repository"),
        )
        .parameter(
            ParameterDefinition::new("repo", ParamKind::String)
                .required()
                .description("Repository name"),
        ),
        ApiEndpoint::new("GET", "/repos/{owner}/{repo}")
            .provider("github")
            .header("Accept", ACCEPT_GITHUB_V3),
    )
}

fn create_issue() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "github_create_issue",
            "Create GitHub Issue",
            "Create an issue in a GitHub repository",
        )
        .parameter(
            ParameterDefinition::new("owner", ParamKind::String)
                .required()
                .description("Owner of the repository"),
        )
        .parameter(
            ParameterDefinition::new("repo", ParamKind::String)
                .required()
                .description("Repository name"),
        )
        .parameter(
            ParameterDefinition::new("title", ParamKind::String)
                .required()
                .description("Issue title"),
        )
        .parameter(ParameterDefinition::new("body", ParamKind::String).description("Issue body")),
        ApiEndpoint::new("POST", "/repos/{owner}/{repo}/issues")
            .provider("github")
            .header("Accept", ACCEPT_GITHUB_V3),
    )
}

fn list_issues() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "github_list_issues",
            "List GitHub Issues",
            "List issues in a GitHub repository",
        )
        .parameter(
            ParameterDefinition::new("owner", ParamKind::String)
                .required()
                .description("Owner of the repository"),
        )
        .parameter(
            ParameterDefinition::new("repo", ParamKind::String)
                .required()
                .description("Repository name"),
        )
        .parameter(
            ParameterDefinition::new("state", ParamKind::String)
                .description("Issue state (open, closed, all)")
                .default_value(json!("open"))
                .allowed_values([json!("open"), json!("closed"), json!("all")]),
        ),
        ApiEndpoint::new("GET", "/repos/{owner}/{repo}/issues")
            .provider("github")
            .header("Accept", ACCEPT_GITHUB_V3)
            .query_param("state", "state"),
    )
}

fn list_branches() -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new(
            "github_list_branches",
            "List GitHub Branches",
            "List branches of a GitHub repository",
        )
        .parameter(
            ParameterDefinition::new("owner", ParamKind::String)
                .required()
                .description("Owner of the repository"),
        )
        .parameter(
            ParameterDefinition::new("repo", ParamKind::String)
                .required()
                .description("Repository name"),
        ),
        ApiEndpoint::new("GET", "/repos/{owner}/{repo}/branches")
            .provider("github")
            .header("Accept", ACCEPT_GITHUB_V3),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_validate() {
        for method in methods() {
            method.validate().expect("valid github definition");
        }
    }

    #[test]
    fn list_issues_routes_state_to_the_query_string() {
        let method = list_issues();
        assert_eq!(method.endpoint.path, "/repos/{owner}/{repo}/issues");
        assert_eq!(
            method.endpoint.query_param_mapping.get("state"),
            Some(&"state".to_string())
        );
    }

    #[test]
    fn create_issue_routes_title_and_body_to_the_request_body() {
        let method = create_issue();
        assert!(method.body_capable());
        assert!(method.endpoint.query_param_mapping.is_empty());
        let names: Vec<&str> = method
            .metadata
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["owner", "repo", "title", "body"]);
    }
}
