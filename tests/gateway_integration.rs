//! End-to-end tests: a gateway on an ephemeral port, mock backends over raw
//! TCP, and the SDK client.

use std::time::Duration;

use integrator_gateway::auth::TokenAuthority;
use integrator_sdk::{Application, DeployRequest, IntegratorClient, SdkError};
use reqwest::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{MockResponse, TestGateway};

fn application(id: &str, host: &str) -> Application {
    Application {
        id: id.into(),
        name: "Application".into(),
        description: "Application under test".into(),
        version: "3.0.0".into(),
        host: host.into(),
    }
}

async fn gateway() -> (TestGateway, IntegratorClient) {
    let gateway = common::start_gateway(|_| {}).await;
    let client = IntegratorClient::new(&gateway.url);
    (gateway, client)
}

#[tokio::test]
async fn test_deploy_then_directory() {
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app-v3", "http://app-v3.com"), "secret")
                .resource("resource-app", "/app/v1"),
        )
        .await
        .unwrap();
    let claims = TokenAuthority::new().validate(&token).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("app-v3"));

    let applications = client.applications().await.unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].id, "app-v3");

    let resources = client.resources("app-v3").await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].path, "/app/v1");

    let resource = client.resource("resource-app").await.unwrap().unwrap();
    assert_eq!(resource.application, "app-v3");
    assert!(client.resource("missing").await.unwrap().is_none());

    gateway.stop().await;
}

#[tokio::test]
async fn test_redeploy_replaces_previous_deployment() {
    let (gateway, client) = gateway().await;

    client
        .deploy(
            &DeployRequest::new(application("app", "http://old.example.com"), "secret")
                .resource("old-resource", "/old"),
        )
        .await
        .unwrap();
    client
        .deploy(
            &DeployRequest::new(application("app", "http://new.example.com"), "secret")
                .resource("new-resource", "/new"),
        )
        .await
        .unwrap();

    let applications = client.applications().await.unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].host, "http://new.example.com");

    let resources = client.resources("app").await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].identifier, "new-resource");

    gateway.stop().await;
}

#[tokio::test]
async fn test_undeploy_unknown_application() {
    let (gateway, client) = gateway().await;

    let err = client.undeploy("missing").await.unwrap_err();
    assert!(matches!(err, SdkError::Status { status, .. } if status == StatusCode::NOT_FOUND));

    gateway.stop().await;
}

#[tokio::test]
async fn test_duplicate_identifier_is_conflict() {
    let (gateway, client) = gateway().await;

    client
        .deploy(
            &DeployRequest::new(application("first", "http://first.example.com"), "secret")
                .resource("shared", "/a"),
        )
        .await
        .unwrap();
    let err = client
        .deploy(
            &DeployRequest::new(application("second", "http://second.example.com"), "secret")
                .resource("shared", "/b"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Status { status, .. } if status == StatusCode::CONFLICT));
    assert_eq!(client.applications().await.unwrap().len(), 1);

    gateway.stop().await;
}

#[tokio::test]
async fn test_proxy_without_token_never_reaches_backend() {
    let backend = common::start_mock_backend(MockResponse::new(200, "{\"ok\":true}")).await;
    let (gateway, client) = gateway().await;

    client
        .deploy(
            &DeployRequest::new(application("app-v3", &backend.host()), "secret")
                .resource("resource-app", "/app/v1"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(Method::GET, "app-v3", "/app/v1", None, None)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PROXY_AUTHENTICATION_REQUIRED);
    assert!(backend.recorded().is_empty());

    gateway.stop().await;
}

#[tokio::test]
async fn test_proxy_forwards_request() {
    let backend = common::start_mock_backend(
        MockResponse::new(201, "{\"id\":42}")
            .header("Content-Type", "application/json")
            .header("X-Backend", "users"),
    )
    .await;
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app", &backend.host()), "secret")
                .resource("user", "/users/{id}"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(
            Method::POST,
            "app",
            "/users/42?expand=orders",
            Some(&token),
            Some(&json!({ "name": "Ada" })),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-backend"], "users");
    assert_eq!(response.text().await.unwrap(), "{\"id\":42}");

    let recorded = backend.recorded();
    assert_eq!(recorded.len(), 1);
    let request = &recorded[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/users/42?expand=orders");
    assert_eq!(request.header("proxy-authorization"), Some(token.as_str()));
    assert_eq!(request.header("host"), Some(backend.addr.to_string().as_str()));
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&request.body).unwrap(),
        json!({ "name": "Ada" })
    );

    gateway.stop().await;
}

#[tokio::test]
async fn test_get_never_forwards_body() {
    let backend = common::start_mock_backend(MockResponse::new(200, "[]")).await;
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app", &backend.host()), "secret")
                .resource("items", "/items"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(
            Method::GET,
            "app",
            "/items",
            Some(&token),
            Some(&json!({ "ignored": true })),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let recorded = backend.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].body.is_empty());

    gateway.stop().await;
}

#[tokio::test]
async fn test_empty_object_response_becomes_empty_body() {
    let backend = common::start_mock_backend(
        MockResponse::new(200, "{}").header("X-Backend", "preserved"),
    )
    .await;
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app", &backend.host()), "secret")
                .resource("thing", "/thing"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(Method::PUT, "app", "/thing", Some(&token), Some(&json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-backend"], "preserved");
    assert!(response.text().await.unwrap().is_empty());

    gateway.stop().await;
}

#[tokio::test]
async fn test_backend_not_found_is_bare() {
    let backend = common::start_mock_backend(
        MockResponse::new(404, "{\"error\":\"gone\"}").header("X-Backend", "hidden"),
    )
    .await;
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app", &backend.host()), "secret")
                .resource("thing", "/thing"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(Method::DELETE, "app", "/thing", Some(&token), None)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-backend").is_none());
    assert!(response.text().await.unwrap().is_empty());

    gateway.stop().await;
}

#[tokio::test]
async fn test_unregistered_path_is_not_found() {
    let backend = common::start_mock_backend(MockResponse::new(200, "{}")).await;
    let (gateway, client) = gateway().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("app", &backend.host()), "secret")
                .resource("thing", "/thing"),
        )
        .await
        .unwrap();

    let response = client
        .proxy(Method::GET, "app", "/other", Some(&token), None)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(backend.recorded().is_empty());

    gateway.stop().await;
}

#[tokio::test]
async fn test_eviction_removes_unreachable_application() {
    let (gateway, client) = gateway().await;
    let closed = common::closed_address().await;

    let token = client
        .deploy(
            &DeployRequest::new(application("gone", &format!("http://{closed}")), "secret")
                .resource("gone-root", "/root"),
        )
        .await
        .unwrap();

    let evicted = gateway.registry.evict_unreachable().await;
    assert_eq!(evicted, vec!["gone".to_string()]);
    assert!(client.applications().await.unwrap().is_empty());

    let response = client
        .proxy(Method::GET, "gone", "/root", Some(&token), None)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    gateway.stop().await;
}

#[tokio::test]
async fn test_scheduled_eviction_keeps_live_applications() {
    let live = common::start_mock_backend(MockResponse::new(200, "{\"status\":\"UP\"}")).await;
    let closed = common::closed_address().await;

    let gateway = common::start_gateway(|config| {
        config.eviction.enabled = true;
        config.eviction.interval_secs = 1;
    })
    .await;
    let client = IntegratorClient::new(&gateway.url);

    client
        .deploy(
            &DeployRequest::new(application("live", &live.host()), "secret")
                .resource("live-root", "/root"),
        )
        .await
        .unwrap();
    client
        .deploy(
            &DeployRequest::new(application("gone", &format!("http://{closed}")), "secret")
                .resource("gone-root", "/root"),
        )
        .await
        .unwrap();

    let registry = gateway.registry.clone();
    let evicted = common::wait_until(
        || registry.find_application("gone").is_none(),
        Duration::from_secs(5),
    )
    .await;
    assert!(evicted);
    assert!(registry.find_application("live").is_some());
    assert!(live
        .recorded()
        .iter()
        .any(|request| request.method == "GET" && request.target == "/status"));

    gateway.stop().await;
}

#[tokio::test]
async fn test_status_endpoint() {
    let (gateway, client) = gateway().await;
    assert_eq!(client.status().await.unwrap()["status"], "UP");
    gateway.stop().await;
}
