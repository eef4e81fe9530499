use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const VALIDATION_MESSAGE: &str = "Input payload validation failed";

/// Errors surfaced to REST clients.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServerError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::validation("model", rejection.body_text())
    }
}

impl From<crate::Error> for ServerError {
    fn from(err: crate::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errors": { field: message },
                    "message": VALIDATION_MESSAGE,
                })),
            )
                .into_response(),
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, Json(message)).into_response(),
            ServerError::Internal(message) => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": message })),
                )
                    .into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
