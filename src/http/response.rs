//! Error responses.
//!
//! # Responsibilities
//! - Map domain errors to HTTP status codes
//! - Render every error as `{"error": "<message>"}`
//!
//! # Design Decisions
//! - A malformed id is reported like a missing one (404)
//! - Reload failures are 502 and say that the file was written
//! - Server-side failures are logged here, client errors are not

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::CatalogError;
use crate::commit::CommitError;
use crate::keys::KeyError;
use crate::model::ValidationError;
use crate::render::RenderError;

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        let status = match &e {
            CatalogError::NotFound { .. } | CatalogError::Malformed(_) => StatusCode::NOT_FOUND,
            CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<KeyError> for ApiError {
    fn from(e: KeyError) -> Self {
        CatalogError::from(e).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        CatalogError::from(e).into()
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<CommitError> for ApiError {
    fn from(e: CommitError) -> Self {
        let status = match &e {
            CommitError::Render(_) | CommitError::Write { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CommitError::Reload { .. } => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::ReloadError;
    use std::path::PathBuf;

    #[test]
    fn test_catalog_error_status() {
        let not_found = CatalogError::NotFound {
            entity: "server",
            id: "prod:web:s9".to_string(),
        };
        assert_eq!(ApiError::from(not_found).status(), StatusCode::NOT_FOUND);

        let malformed = CatalogError::Malformed(KeyError::EmptySegment {
            entity: "server",
            id: "prod::s1".to_string(),
        });
        assert_eq!(ApiError::from(malformed).status(), StatusCode::NOT_FOUND);

        let invalid = ValidationError::unique("server.name");
        assert_eq!(
            ApiError::from(invalid).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_reload_failure_is_bad_gateway() {
        let e = CommitError::Reload {
            path: PathBuf::from("/etc/haproxy/prod.cfg"),
            source: ReloadError::EmptyCommand,
        };
        let api = ApiError::from(e);
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert!(api.message().contains("wrote /etc/haproxy/prod.cfg"));
    }
}
