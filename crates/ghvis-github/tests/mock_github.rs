//! Mock GitHub tests for the REST client.
//!
//! These tests use wiremock to simulate the GitHub API and check the
//! client's requests and error mapping without network access.

use ghvis_core::error::Error;
use ghvis_core::{
    ApiUrl, BatchMode, BatchOrchestrator, BatchPolicy, BatchRequest, BearerToken, RepoRef,
    VisibilityRemote,
};
use ghvis_github::GithubClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_api(server: &MockServer) -> ApiUrl {
    ApiUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(mock_api(server), &BearerToken::new("ghp_testtoken")).unwrap()
}

fn repo_json(owner: &str, name: &str, private: bool) -> serde_json::Value {
    json!({
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "owner": { "login": owner },
        "private": private,
        "description": null,
        "html_url": format!("https://github.com/{}/{}", owner, name),
        "language": "Rust",
        "size": 2048,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-06-01T00:00:00Z"
    })
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_validate_returns_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ghp_testtoken"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "id": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let login = client(&server).validate().await.unwrap();
    assert_eq!(login, "octocat");
}

#[tokio::test]
async fn test_validate_bad_credentials_keeps_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;

    let err = client(&server).validate().await.unwrap_err();
    match err {
        Error::Remote(remote) => {
            assert_eq!(remote.status, 401);
            assert_eq!(remote.message, "Bad credentials");
            assert!(remote.is_auth_error());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_body_uses_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).validate().await.unwrap_err();
    assert!(err.to_string().contains("HTTP 502"));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let api = ApiUrl::new("http://127.0.0.1:9").unwrap();
    let client = GithubClient::new(api, &BearerToken::new("ghp_testtoken")).unwrap();

    let err = client.validate().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

// ============================================================================
// Repository reads
// ============================================================================

#[tokio::test]
async fn test_get_repository_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("octocat", "hello", true)))
        .mount(&server)
        .await;

    let repo = RepoRef::new("octocat/hello").unwrap();
    let info = client(&server).get_repository(&repo).await.unwrap().unwrap();

    assert_eq!(info.owner, "octocat");
    assert!(info.private);
    assert_eq!(info.language.as_deref(), Some("Rust"));
    assert_eq!(info.size_mb(), 2.0);
}

#[tokio::test]
async fn test_get_repository_not_found_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found"
        })))
        .mount(&server)
        .await;

    let repo = RepoRef::new("octocat/missing").unwrap();
    assert!(client(&server).get_repository(&repo).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_repository_server_error_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Server Error"
        })))
        .mount(&server)
        .await;

    let repo = RepoRef::new("octocat/hello").unwrap();
    let err = client(&server).get_repository(&repo).await.unwrap_err();
    assert!(matches!(err, Error::Remote(ref r) if r.status == 500));
}

#[tokio::test]
async fn test_list_repositories_pages() {
    let server = MockServer::start().await;

    let first: Vec<_> = (0..100)
        .map(|i| repo_json("octocat", &format!("repo{}", i), false))
        .collect();

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .and(query_param("type", "all"))
        .and(query_param("sort", "updated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![repo_json("octocat", "last", true)]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repos = client(&server).list_repositories().await.unwrap();
    assert_eq!(repos.len(), 101);
    assert_eq!(repos[100].name, "last");
}

// ============================================================================
// Visibility changes
// ============================================================================

#[tokio::test]
async fn test_set_visibility_sends_patch() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/hello"))
        .and(body_json(json!({ "private": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("octocat", "hello", true)))
        .expect(1)
        .mount(&server)
        .await;

    let repo = RepoRef::new("octocat/hello").unwrap();
    let message = client(&server).set_visibility(&repo, true).await.unwrap();
    assert_eq!(message, "Repository hello is now private");
}

#[tokio::test]
async fn test_set_visibility_failure_keeps_remote_message() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/fork"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Visibility can't be changed for forks"
        })))
        .mount(&server)
        .await;

    let repo = RepoRef::new("octocat/fork").unwrap();
    let err = client(&server).set_visibility(&repo, false).await.unwrap_err();
    match err {
        Error::Remote(remote) => {
            assert_eq!(remote.status, 422);
            assert_eq!(remote.message, "Visibility can't be changed for forks");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Batch against the REST client
// ============================================================================

#[tokio::test]
async fn test_batch_auto_toggle_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/public-repo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(repo_json("octocat", "public-repo", false)),
        )
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/public-repo"))
        .and(body_json(json!({ "private": true })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(repo_json("octocat", "public-repo", true)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/repos/octocat/gone"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = BatchOrchestrator::new(BatchPolicy {
        pacing: Duration::from_millis(1),
        ..BatchPolicy::default()
    });
    let request = BatchRequest::new(
        BatchMode::AutoToggle,
        [
            RepoRef::new("octocat/public-repo").unwrap(),
            RepoRef::new("octocat/gone").unwrap(),
            RepoRef::new("octocat/public-repo").unwrap(),
        ],
    );

    let report = orchestrator.run(&client(&server), &request).await.unwrap();

    assert_eq!(report.len(), 2);
    let toggled = report
        .get(&RepoRef::new("octocat/public-repo").unwrap())
        .unwrap();
    assert!(toggled.success());
    assert_eq!(toggled.resulting_visibility_label(), "private");
    let gone = report.get(&RepoRef::new("octocat/gone").unwrap()).unwrap();
    assert!(!gone.success());
    assert_eq!(gone.resulting_visibility_label(), "unknown");
}
