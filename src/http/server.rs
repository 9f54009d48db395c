//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and stop on shutdown signal

use axum::{body::Body, http::Request, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::catalog::Catalog;
use crate::commit::Committer;
use crate::config::HarpConfig;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::shutdown_signal;

/// Application state injected into handlers.
///
/// The catalog mutex is the transaction boundary: one request mutates or
/// renders at a time, and a commit holds it until the reload returns.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Mutex<Catalog>>,
    pub committer: Arc<Committer>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(catalog: Catalog, committer: Committer, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            committer: Arc::new(committer),
            api_key: api_key.into(),
        }
    }
}

/// HTTP server for the management API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &HarpConfig, state: AppState) -> Self {
        Self {
            router: build_router(state, config.admin.request_timeout()),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(admin::handlers::get_status))
        .nest("/api/v1", admin::router(state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
}
