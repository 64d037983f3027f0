//! Computation request and result

use mca_common::api::{CoincidenceCallback, CoincidenceRequest, CoincidenceResponse, SharedSecret};

/// One request to score a join record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputationRequest {
    /// Join-record id; the unit of in-flight deduplication
    pub join_record_id: i64,
    pub composer_id: i64,
    pub analysis_id: i64,
    /// Caller-supplied shared secret
    pub secret_key: String,
}

impl ComputationRequest {
    /// Reject requests whose ids cannot refer to backend rows
    ///
    /// Backend ids start at 1, so zero or negative means the caller dropped a
    /// field.
    pub fn validate(&self) -> Result<(), String> {
        let ids = [
            ("composer_analysis_id", self.join_record_id),
            ("composer_id", self.composer_id),
            ("analysis_id", self.analysis_id),
        ];
        for (name, value) in ids {
            if value <= 0 {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }
        Ok(())
    }
}

impl From<CoincidenceRequest> for ComputationRequest {
    fn from(request: CoincidenceRequest) -> Self {
        Self {
            join_record_id: request.composer_analysis_id,
            composer_id: request.composer_id,
            analysis_id: request.analysis_id,
            secret_key: request.secret_key,
        }
    }
}

/// Status marker of a finished computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationStatus {
    Completed,
}

impl ComputationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ComputationStatus::Completed => "completed",
        }
    }
}

/// Score for one join record
#[derive(Debug, Clone, PartialEq)]
pub struct ComputationResult {
    pub join_record_id: i64,
    /// Coincidence score in [0, 100]
    pub score: f64,
    pub status: ComputationStatus,
}

impl ComputationResult {
    pub fn completed(join_record_id: i64, score: f64) -> Self {
        Self {
            join_record_id,
            score,
            status: ComputationStatus::Completed,
        }
    }

    /// Body returned by the sync endpoint
    pub fn to_response(&self, secret: &SharedSecret) -> CoincidenceResponse {
        CoincidenceResponse {
            composer_analysis_id: self.join_record_id,
            potential_coincidence: self.score,
            secret_key: secret.expose().to_string(),
            status: self.status.as_str().to_string(),
        }
    }

    /// Body POSTed to the backend callback
    pub fn to_callback(&self, secret: &SharedSecret) -> CoincidenceCallback {
        CoincidenceCallback {
            composer_analysis_id: self.join_record_id,
            potential_coincidence: self.score,
            secret_key: secret.expose().to_string(),
        }
    }
}
