//! Shared fixtures for integration tests.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tower::ServiceExt;

use harp::catalog::Catalog;
use harp::commit::Committer;
use harp::config::HarpConfig;
use harp::http::{server::build_router, AppState};
use harp::model::{Configuration, Mode, Proxy, Server};

pub const API_KEY: &str = "test-key";

/// `prod` with only the defaults section and one backend `web` holding `s1`.
pub fn example_configuration(filepath: impl Into<PathBuf>) -> Configuration {
    let mut configuration =
        Configuration::new("prod", filepath, "/var/run/haproxy.pid").unwrap();
    configuration.include_globals = false;
    configuration.include_defaults = true;
    configuration.default_mode = Mode::Http;

    let mut web = Proxy::backend("web").unwrap();
    web.options.mode = Some(Mode::Http);
    let mut s1 = Server::new("s1", "10.0.0.1").unwrap();
    s1.options.port = Some(8080);
    web.as_backend_mut().unwrap().add_server(s1).unwrap();
    configuration.add_proxy(web).unwrap();
    configuration
}

/// Exact rendering of [`example_configuration`].
pub const EXAMPLE_TEXT: &str = "\
defaults
    mode http
    timeout connect 5000ms
    timeout client 50000ms
    timeout server 50000ms

backend web
    mode http
    server s1 10.0.0.1 port 8080
";

/// The API router over `catalog`, with an optional default reload command.
pub fn app(catalog: Catalog, reload_command: Option<&str>) -> Router {
    let committer = Committer::new(Duration::from_secs(5))
        .with_default_command(reload_command.map(str::to_string));
    let state = AppState::new(catalog, committer, API_KEY);
    build_router(state, Duration::from_secs(10))
}

/// The API router over `catalog`, with timeouts and reload command from `config`.
pub fn app_with_config(catalog: Catalog, config: &HarpConfig) -> Router {
    let committer =
        Committer::new(config.reload.timeout()).with_default_command(config.reload.command.clone());
    let state = AppState::new(catalog, committer, API_KEY);
    build_router(state, config.admin.request_timeout())
}

/// Send an authenticated request, returning status and parsed JSON body
/// (`Value::Null` when the body is empty).
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, text) = send_raw(router, method, uri, body).await;
    let json = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, json)
}

/// Like [`send`] but returns the body as text.
pub async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", API_KEY));
    let body = match body {
        Some(json) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
