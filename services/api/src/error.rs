//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! translation into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use habitflow_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents malformed or semantically invalid request input, carrying
    /// which field failed and why.
    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: &str, message: &str) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// A convenience type alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": [{ "field": field, "message": message }] })),
            )
                .into_response(),
            ApiError::Port(PortError::NotFound(message)) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": message })),
            )
                .into_response(),
            other => {
                error!("Internal error while serving request: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
