//! Management API.
//!
//! # Routes (under `/api/v1`, bearer token required)
//! ```text
//! /configurations[/{id}]        GET list/get, POST create, PUT patch (+ "commit"), DELETE
//! /configurations/{id}/render   GET rendered text
//! /configurations/{id}/rename   POST {"name"}
//! /frontends[/{id}]             same verbs, /{id}/rename
//! /backends[/{id}]              same verbs, /{id}/rename
//! /servers[/{id}]               GET, POST {"parent", ...}, PUT, DELETE
//! /targets[/{id}]               GET, POST {"parent", ...}, PUT, DELETE
//! /acls[/{id}]                  GET, POST {"parent", "name", "acls"}, PUT {"acls"}, DELETE
//! ```

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/configurations",
            get(list_configurations).post(create_configuration),
        )
        .route(
            "/configurations/{id}",
            get(get_configuration)
                .put(update_configuration)
                .delete(delete_configuration),
        )
        .route("/configurations/{id}/render", get(render_configuration))
        .route("/configurations/{id}/rename", post(rename_configuration))
        .route("/frontends", get(list_frontends).post(create_frontend))
        .route(
            "/frontends/{id}",
            get(get_frontend).put(update_frontend).delete(delete_frontend),
        )
        .route("/frontends/{id}/rename", post(rename_frontend))
        .route("/backends", get(list_backends).post(create_backend))
        .route(
            "/backends/{id}",
            get(get_backend).put(update_backend).delete(delete_backend),
        )
        .route("/backends/{id}/rename", post(rename_backend))
        .route("/servers", get(list_servers).post(create_server))
        .route(
            "/servers/{id}",
            get(get_server).put(update_server).delete(delete_server),
        )
        .route("/targets", get(list_targets).post(create_target))
        .route(
            "/targets/{id}",
            get(get_target).put(update_target).delete(delete_target),
        )
        .route("/acls", get(list_acls).post(create_acls))
        .route(
            "/acls/{id}",
            get(get_acls).put(update_acls).delete(delete_acls),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
