//! End-to-end controller tests against an in-process echo server.

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::any;
use scm_plugin_sdk::config::{ConfigStore, RuntimeConfig};
use scm_plugin_sdk::credentials::{GITHUB_TOKEN_KEY, GITLAB_TOKEN_KEY};
use scm_plugin_sdk::{
    ApiEndpoint, Controller, MethodMetadata, ParamKind, ParameterDefinition, PluginError,
    PluginMethod, ProviderMethods, Registry, SharedRegistry,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;

struct EchoServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl EchoServer {
    async fn spawn() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_handler = hits.clone();

        let echo = move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let hits = hits_handler.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if uri.path().ends_with("/missing") {
                    return (
                        StatusCode::NOT_FOUND,
                        axum::Json(json!({"message": "Not Found"})),
                    );
                }
                let authorization = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let accept = headers
                    .get("accept")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                (
                    StatusCode::OK,
                    axum::Json(json!({
                        "method": method.as_str(),
                        "path": uri.path(),
                        "query": uri.query().unwrap_or(""),
                        "authorization": authorization,
                        "accept": accept,
                        "body": String::from_utf8_lossy(&body),
                    })),
                )
            }
        };

        let app = Router::new().route("/{*path}", any(echo));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");

        let server = axum::serve(listener, app);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = server.with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Self {
            base_url: format!("http://{addr}"),
            hits,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

fn config_with_tokens(pairs: &[(&str, &str)]) -> Arc<ConfigStore> {
    let mut config = RuntimeConfig::default_scm();
    for param in &mut config.init_config[0].params {
        if let Some((_, token)) = pairs.iter().find(|(key, _)| *key == param.key) {
            param.value = vec![json!(token)];
        }
    }
    Arc::new(ConfigStore::in_memory(config))
}

fn controller_for(methods: Vec<PluginMethod>, config: Arc<ConfigStore>) -> Controller {
    let registry = Registry::discover(vec![ProviderMethods {
        provider: "test",
        methods,
    }])
    .expect("discover");
    Controller::new(SharedRegistry::new(registry), config)
        .with_timeout(Duration::from_secs(5))
}

fn get_issues_method(base_url: &str) -> PluginMethod {
    PluginMethod::new(
        MethodMetadata::new("list_issues", "List Issues", "List issues for a repository")
            .parameter(ParameterDefinition::new("owner", ParamKind::String).required())
            .parameter(ParameterDefinition::new("repo", ParamKind::String).required())
            .parameter(
                ParameterDefinition::new("state", ParamKind::String)
                    .default_value(json!("open"))
                    .allowed_values([json!("open"), json!("closed"), json!("all")]),
            ),
        ApiEndpoint::new("GET", format!("{base_url}/repos/{{owner}}/{{repo}}/issues"))
            .header("Accept", "application/json")
            .query_param("state", "state"),
    )
}

#[tokio::test]
async fn execute_templates_path_query_and_credential_header() {
    let server = EchoServer::spawn().await;
    let controller = controller_for(
        vec![get_issues_method(&server.base_url)],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let response = controller
        .execute("list_issues", args(json!({"owner": "acme", "repo": "widgets"})))
        .await
        .expect("execute");

    assert_eq!(response.status, 200);
    assert_eq!(response.body["method"], "GET");
    assert_eq!(response.body["path"], "/repos/acme/widgets/issues");
    assert_eq!(response.body["query"], "state=open");
    assert_eq!(response.body["authorization"], "Bearer ghp_abc");
    assert_eq!(response.body["accept"], "application/json");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);

    server.stop().await;
}

#[tokio::test]
async fn validation_failure_makes_no_outbound_call() {
    let server = EchoServer::spawn().await;
    let controller = controller_for(
        vec![get_issues_method(&server.base_url)],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let err = controller
        .execute("list_issues", args(json!({"owner": "acme"})))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Validation { ref param, .. } if param == "repo"));

    let err = controller
        .execute(
            "list_issues",
            args(json!({"owner": "acme", "repo": "widgets", "state": "frozen"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::Validation { .. }));

    assert_eq!(server.hits.load(Ordering::SeqCst), 0);
    server.stop().await;
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let server = EchoServer::spawn().await;
    let controller = controller_for(
        vec![get_issues_method(&server.base_url)],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let err = controller.execute("no_such_method", Map::new()).await.unwrap_err();
    assert!(matches!(err, PluginError::NotFound { ref method } if method == "no_such_method"));
    assert_eq!(server.hits.load(Ordering::SeqCst), 0);
    server.stop().await;
}

#[tokio::test]
async fn post_sends_unmapped_parameters_as_json_body() {
    let server = EchoServer::spawn().await;
    let method = PluginMethod::new(
        MethodMetadata::new("create_issue", "Create Issue", "Open a new issue")
            .parameter(ParameterDefinition::new("owner", ParamKind::String).required())
            .parameter(ParameterDefinition::new("repo", ParamKind::String).required())
            .parameter(ParameterDefinition::new("title", ParamKind::String).required())
            .parameter(ParameterDefinition::new("labels", ParamKind::Array)),
        ApiEndpoint::new("POST", format!("{}/repos/{{owner}}/{{repo}}/issues", server.base_url)),
    );
    let controller = controller_for(
        vec![method],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let response = controller
        .execute(
            "create_issue",
            args(json!({
                "owner": "acme", "repo": "widgets",
                "title": "Bug", "labels": ["p1"],
            })),
        )
        .await
        .expect("execute");

    assert_eq!(response.body["method"], "POST");
    let body: Value =
        serde_json::from_str(response.body["body"].as_str().expect("body")).expect("json body");
    assert_eq!(body, json!({"labels": ["p1"], "title": "Bug"}));
    server.stop().await;
}

#[tokio::test]
async fn upstream_error_status_passes_through() {
    let server = EchoServer::spawn().await;
    let method = PluginMethod::new(
        MethodMetadata::new("get_missing", "Get Missing", ""),
        ApiEndpoint::new("GET", format!("{}/missing", server.base_url)),
    );
    let controller = controller_for(
        vec![method],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let response = controller.execute("get_missing", Map::new()).await.expect("execute");
    assert_eq!(response.status, 404);
    assert_eq!(response.body["message"], "Not Found");
    server.stop().await;
}

#[tokio::test]
async fn unreachable_upstream_is_upstream_unavailable() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    drop(listener);

    let method = PluginMethod::new(
        MethodMetadata::new("dead_call", "Dead Call", ""),
        ApiEndpoint::new("GET", format!("http://{addr}/things")),
    );
    let controller = controller_for(
        vec![method],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc")]),
    );

    let err = controller.execute("dead_call", Map::new()).await.unwrap_err();
    match err {
        PluginError::UpstreamUnavailable(reason) => {
            assert!(!reason.contains("ghp_abc"));
        }
        other => panic!("expected UpstreamUnavailable, got {other}"),
    }
}

#[tokio::test]
async fn no_usable_credential_blocks_the_call() {
    let server = EchoServer::spawn().await;
    let controller = controller_for(
        vec![get_issues_method(&server.base_url)],
        config_with_tokens(&[]),
    );

    let err = controller
        .execute("list_issues", args(json!({"owner": "acme", "repo": "widgets"})))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::NoCredential { .. }));
    assert_eq!(server.hits.load(Ordering::SeqCst), 0);
    server.stop().await;
}

#[tokio::test]
async fn multi_credential_set_routes_by_url_markers() {
    let server = EchoServer::spawn().await;
    // A localhost URL with a GitLab API path prefix routes to the GitLab
    // token when both tokens are configured.
    let method = PluginMethod::new(
        MethodMetadata::new("gitlab_list_projects", "List Projects", "")
            .parameter(
                ParameterDefinition::new("membership", ParamKind::Boolean)
                    .default_value(json!(true)),
            ),
        ApiEndpoint::new("GET", format!("{}/api/v4/projects", server.base_url))
            .query_param("membership", "membership"),
    );
    let controller = controller_for(
        vec![method],
        config_with_tokens(&[(GITHUB_TOKEN_KEY, "ghp_abc"), (GITLAB_TOKEN_KEY, "glpat-xyz")]),
    );

    let response = controller
        .execute("gitlab_list_projects", Map::new())
        .await
        .expect("execute");
    assert_eq!(response.body["authorization"], "Bearer glpat-xyz");
    assert_eq!(response.body["query"], "membership=true");
    server.stop().await;
}
