//! Error types for mca-coincidence
//!
//! Every error leaves the service in the `{"error": {"code", "message"}}`
//! envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mca_common::api::ErrorResponse;
use thiserror::Error;

use crate::services::{CoincidenceError, RemoteError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, missing fields or non-positive ids (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Secret key mismatch (401)
    #[error("Invalid secret key")]
    Unauthorized,

    /// Join record already in flight (409)
    #[error("{0}")]
    Conflict(String),

    /// Backend unreachable or failing (502)
    #[error("{0}")]
    RemoteUnavailable(String),

    /// Backend refused the request or sent garbage (502)
    #[error("{0}")]
    RemoteRejected(String),

    /// Synchronous calculation exceeded its deadline (504)
    #[error("Calculation timed out after {0} seconds")]
    Timeout(u64),

    /// Service shutting down (503)
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl From<CoincidenceError> for ApiError {
    fn from(err: CoincidenceError) -> Self {
        match err {
            CoincidenceError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            CoincidenceError::Unauthorized => ApiError::Unauthorized,
            CoincidenceError::Conflict(_) => ApiError::Conflict(err.to_string()),
            CoincidenceError::Remote(remote @ RemoteError::Unavailable(_)) => {
                ApiError::RemoteUnavailable(remote.to_string())
            }
            CoincidenceError::Remote(remote @ RemoteError::Rejected { .. }) => {
                ApiError::RemoteRejected(remote.to_string())
            }
            CoincidenceError::Cancelled => ApiError::ShuttingDown,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::RemoteUnavailable(_) => (StatusCode::BAD_GATEWAY, "REMOTE_UNAVAILABLE"),
            ApiError::RemoteRejected(_) => (StatusCode::BAD_GATEWAY, "REMOTE_REJECTED"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN"),
        };

        let body = Json(ErrorResponse::new(error_code, self.to_string()));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
