//! Management API driven in-process.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{app, app_with_config, example_configuration, send, send_raw, API_KEY, EXAMPLE_TEXT};
use harp::catalog::Catalog;
use harp::config::{validate_config, HarpConfig};

fn seeded(filepath: &std::path::Path) -> Catalog {
    Catalog::from_configurations([example_configuration(filepath)]).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let router = app(Catalog::new(), None);
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_api_requires_token() {
    let router = app(Catalog::new(), None);
    let response = router
        .clone()
        .oneshot(
            Request::get("/api/v1/configurations")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(
            Request::get("/api/v1/configurations")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_build_and_render_through_api() {
    let router = app(Catalog::new(), None);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/configurations",
        Some(json!({
            "name": "prod",
            "filepath": "/etc/haproxy/prod.cfg",
            "pidfile": "/var/run/haproxy.pid",
            "include_globals": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "prod");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/backends",
        Some(json!({ "parent": "prod", "name": "web", "mode": "http" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "prod:web");
    assert_eq!(body["kind"], "backend");

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/servers",
        Some(json!({ "parent": "prod:web", "name": "s1", "address": "10.0.0.1", "port": 8080 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "prod:web:s1");

    let (status, text) = send_raw(
        &router,
        Method::GET,
        "/api/v1/configurations/prod/render",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, EXAMPLE_TEXT);
}

#[tokio::test]
async fn test_status_mapping() {
    let router = app(seeded("/etc/haproxy/prod.cfg".as_ref()), None);

    // Missing entity.
    let (status, body) = send(&router, Method::GET, "/api/v1/servers/prod:web:s9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    // Malformed id is reported like a missing one.
    let (status, _) = send(&router, Method::GET, "/api/v1/servers/prod", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Kind mismatch.
    let (status, _) = send(&router, Method::GET, "/api/v1/frontends/prod:web", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Duplicate name.
    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/backends",
        Some(json!({ "parent": "prod", "name": "web" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "proxy.name must be unique");
}

#[tokio::test]
async fn test_partial_update_and_rename() {
    let router = app(seeded("/etc/haproxy/prod.cfg".as_ref()), None);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/servers/prod:web:s1",
        Some(json!({ "check": true, "weight": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["check"], true);
    assert_eq!(body["port"], 8080);

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/v1/servers/prod:web:s1",
        Some(json!({ "name": "s2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/backends/prod:web/rename",
        Some(json!({ "name": "pool" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "prod:pool");

    let (status, body) = send(&router, Method::GET, "/api/v1/servers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "prod:pool:s1");
}

#[tokio::test]
async fn test_targets_and_acls() {
    let router = app(seeded("/etc/haproxy/prod.cfg".as_ref()), None);

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/frontends",
        Some(json!({ "parent": "prod", "name": "http-in", "bind": "*:80" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A server cannot live in a frontend.
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/servers",
        Some(json!({ "parent": "prod:http-in", "name": "s1", "address": "10.0.0.1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/targets",
        Some(json!({ "parent": "prod:http-in", "rank": 1, "backend": "web", "condition": "is_api" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "prod:http-in:1");
    assert_eq!(body["operator"], "if");

    let (status, _) = send(
        &router,
        Method::POST,
        "/api/v1/targets",
        Some(json!({ "parent": "prod:http-in", "rank": 1, "backend": "web", "condition": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/acls",
        Some(json!({ "parent": "prod:http-in", "name": "is_api", "acls": ["path_beg /api", "hdr(host) api"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "prod:http-in:is_api");

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/acls/prod:http-in:is_api",
        Some(json!({ "acls": ["hdr(host) api", "path_beg /v2"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], json!(["path_beg /v2"]));
    assert_eq!(body["removed"], json!(["path_beg /api"]));
    assert_eq!(body["acls"], json!(["hdr(host) api", "path_beg /v2"]));

    let (status, _) = send(&router, Method::DELETE, "/api/v1/acls/prod:http-in:is_api", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, Method::GET, "/api/v1/acls/prod:http-in:is_api", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_with_commit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("haproxy.cfg");
    let router = app(seeded(&path), Some("true"));

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/configurations/prod",
        Some(json!({ "default_client_timeout": "30s", "commit": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commit"]["reloaded"], true);
    assert!(fs::read_to_string(&path)
        .unwrap()
        .contains("timeout client 30s"));
}

#[tokio::test]
async fn test_update_without_commit_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("haproxy.cfg");
    let router = app(seeded(&path), Some("true"));

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/configurations/prod",
        Some(json!({ "default_client_timeout": "30s" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("commit").is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_reload_failure_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("haproxy.cfg");
    let router = app(seeded(&path), Some("false"));

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/configurations/prod",
        Some(json!({ "commit": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("wrote "));
    assert_eq!(fs::read_to_string(&path).unwrap(), EXAMPLE_TEXT);
}

#[tokio::test]
async fn test_reload_timeout_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("haproxy.cfg");

    let mut config = HarpConfig::default();
    config.admin.api_key = API_KEY.to_string();
    config.admin.request_timeout_secs = 3;
    config.reload.timeout_secs = 1;
    config.reload.command = Some("sleep 10".to_string());
    validate_config(&config).unwrap();
    let router = app_with_config(seeded(&path), &config);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/configurations/prod",
        Some(json!({ "commit": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("wrote "));
    assert_eq!(fs::read_to_string(&path).unwrap(), EXAMPLE_TEXT);
}

#[tokio::test]
async fn test_create_rejects_unknown_field() {
    let dir = TempDir::new().unwrap();
    let router = app(seeded(&dir.path().join("haproxy.cfg")), None);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/servers",
        Some(json!({ "parent": "prod:web", "name": "s2", "address": "10.0.0.2", "wieght": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("wieght"));

    let (status, _) = send(&router, Method::GET, "/api/v1/servers/prod:web:s2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/backends",
        Some(json!({ "parent": "prod", "name": "api", "mdoe": "tcp" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("mdoe"));
}

#[tokio::test]
async fn test_update_acls_creates_missing_set() {
    let dir = TempDir::new().unwrap();
    let router = app(seeded(&dir.path().join("haproxy.cfg")), None);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/acls/prod:web:is_static",
        Some(json!({ "acls": ["path_beg /static"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acls"], json!(["path_beg /static"]));
    assert_eq!(body["added"], json!(["path_beg /static"]));

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/v1/acls/prod:missing:is_static",
        Some(json!({ "acls": ["path_beg /static"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
