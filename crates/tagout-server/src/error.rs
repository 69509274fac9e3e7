//! HTTP mapping of persistence errors.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tagout_core::storage::PersistenceError;

/// Error returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// Missing or malformed identity headers.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Body that is not JSON or does not match the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::InvalidBody(rejection) => (rejection.status(), "INVALID_BODY"),
            ApiError::Persistence(err) => match err {
                PersistenceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                PersistenceError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                PersistenceError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                PersistenceError::Workflow(_) => (StatusCode::CONFLICT, "ILLEGAL_TRANSITION"),
                PersistenceError::Transport(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}
