use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Request-level failures, rendered as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("no document index is loaded")]
    NoContext,

    #[error("answering failed: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct Detail<T: Serialize> {
    detail: T,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, Json(Detail { detail: errors })).into_response(),
            ApiError::Rejected { status, message } => (status, Json(Detail { detail: message })).into_response(),
            ApiError::NoContext => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(Detail { detail: self.to_string() })).into_response()
            }
            ApiError::Upstream(ref e) => {
                tracing::error!(error = %e, "ask failed");
                (StatusCode::BAD_GATEWAY, Json(Detail { detail: self.to_string() })).into_response()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("invalid bind address {0:?}")]
    Address(String),
    #[error("server error: {0}")]
    Server(String),
}
