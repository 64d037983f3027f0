//! Wire payloads shared with the backend
//!
//! Field names are snake_case JSON, matching what the backend sends and
//! expects in callbacks.

use serde::{Deserialize, Serialize};

// ========================================
// Inbound
// ========================================

/// Body of both calculation endpoints (async and sync)
///
/// # Examples
///
/// ```
/// use mca_common::api::types::CoincidenceRequest;
///
/// let body = r#"{
///     "composer_analysis_id": 17,
///     "composer_id": 3,
///     "analysis_id": 42,
///     "secret_key": "music_analysis_secret_2024"
/// }"#;
///
/// let request: CoincidenceRequest = serde_json::from_str(body).unwrap();
/// assert_eq!(request.composer_analysis_id, 17);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CoincidenceRequest {
    /// Join-record id (composer ↔ analysis association)
    pub composer_analysis_id: i64,
    pub composer_id: i64,
    pub analysis_id: i64,
    pub secret_key: String,
}

// ========================================
// Outbound
// ========================================

/// 202 body of the async endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AcceptedResponse {
    /// Always "accepted"
    pub status: String,
    pub message: String,
}

impl AcceptedResponse {
    pub fn started() -> Self {
        Self {
            status: "accepted".to_string(),
            message: "Coincidence calculation started".to_string(),
        }
    }
}

/// 200 body of the sync endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CoincidenceResponse {
    pub composer_analysis_id: i64,
    pub potential_coincidence: f64,
    pub secret_key: String,
    /// Always "completed"
    pub status: String,
}

/// Callback body POSTed to the backend after an async calculation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CoincidenceCallback {
    pub composer_analysis_id: i64,
    pub potential_coincidence: f64,
    pub secret_key: String,
}

// ========================================
// Error Response Types
// ========================================

/// Error envelope returned by every failing endpoint
///
/// ```json
/// {"error": {"code": "CONFLICT", "message": "..."}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Inner part of [`ErrorResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code (e.g. "UNAUTHORIZED")
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
