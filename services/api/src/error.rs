//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failed authentication, wrong password or insufficient role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique key already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No handler for the requested route
    #[error("Not implemented")]
    NotImplemented,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotImplemented => {
                (StatusCode::NOT_IMPLEMENTED, "Not implemented".to_string())
            }
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Store(StoreError::Duplicate { field, value }) => (
                StatusCode::CONFLICT,
                format!("The {} {} is already in use", field, value),
            ),
            ApiError::Store(StoreError::Database(e)) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
