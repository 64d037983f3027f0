//! Coincidence calculation endpoints
//!
//! - `POST /api/calculate-coincidence`: accept and return 202; the score is
//!   delivered to the backend callback later
//! - `POST /api/calculate-coincidence-sync`: compute inline and return the
//!   score

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use mca_common::api::{AcceptedResponse, CoincidenceRequest, CoincidenceResponse};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Unwrap a JSON body, reporting malformed or incomplete payloads as 400
fn parse_body(payload: Result<Json<CoincidenceRequest>, JsonRejection>) -> ApiResult<CoincidenceRequest> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// POST /api/calculate-coincidence
pub async fn calculate_coincidence(
    State(state): State<AppState>,
    payload: Result<Json<CoincidenceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AcceptedResponse>)> {
    let request = parse_body(payload)?;

    // The join handle is dropped here; the task keeps running detached
    state.coordinator.submit_async(request.into())?;

    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::started())))
}

/// POST /api/calculate-coincidence-sync
///
/// Bounded by `compute.sync_deadline_secs` when configured.
pub async fn calculate_coincidence_sync(
    State(state): State<AppState>,
    payload: Result<Json<CoincidenceRequest>, JsonRejection>,
) -> ApiResult<Json<CoincidenceResponse>> {
    let request = parse_body(payload)?;
    let join_record_id = request.composer_analysis_id;

    let cancel = state.coordinator.cancellation_token();
    let work = state.coordinator.submit_sync(request.into(), &cancel);

    let result = match state.sync_deadline {
        Some(deadline) => tokio::time::timeout(deadline, work).await.map_err(|_| {
            warn!(
                composer_analysis_id = join_record_id,
                deadline_secs = deadline.as_secs(),
                "Synchronous calculation exceeded deadline"
            );
            ApiError::Timeout(deadline.as_secs())
        })??,
        None => work.await?,
    };

    Ok(Json(result.to_response(state.coordinator.secret())))
}

/// Build calculation routes
pub fn coincidence_routes() -> Router<AppState> {
    Router::new()
        .route("/api/calculate-coincidence", post(calculate_coincidence))
        .route("/api/calculate-coincidence-sync", post(calculate_coincidence_sync))
}
