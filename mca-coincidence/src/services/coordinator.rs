//! Processing coordinator
//!
//! Orchestrates fetch → compute → deliver for one join record. Two modes:
//!
//! - [`Coordinator::submit_async`]: deduplicated by join-record id, runs in a
//!   background task and pushes the score to the backend callback
//! - [`Coordinator::submit_sync`]: runs inline and returns the score; no
//!   deduplication and no callback
//!
//! Async tasks are tracked so [`Coordinator::shutdown`] can cancel the ones
//! still waiting in the delay phase and wait for the rest to finish.

use std::sync::Arc;

use mca_common::api::SharedSecret;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::backend_client::{DataBackend, RemoteError};
use super::in_flight::{InFlightGuard, InFlightRegistry};
use super::similarity::{CalculationCancelled, CoincidenceCalculator};
use crate::models::{ComputationRequest, ComputationResult};

/// Why a submission was refused or a pipeline failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoincidenceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid secret key")]
    Unauthorized,

    #[error("Analysis {0} is already being processed")]
    Conflict(i64),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Calculation cancelled")]
    Cancelled,
}

impl From<CalculationCancelled> for CoincidenceError {
    fn from(_: CalculationCancelled) -> Self {
        CoincidenceError::Cancelled
    }
}

/// Handle to an accepted async submission
///
/// Dropping `task` detaches it; the pipeline keeps running.
#[derive(Debug)]
pub struct Accepted {
    pub join_record_id: i64,
    pub task: JoinHandle<Result<ComputationResult, CoincidenceError>>,
}

/// Fetch/compute half of the pipeline, shared by both submission modes
#[derive(Clone)]
struct Pipeline {
    backend: Arc<dyn DataBackend>,
    calculator: Arc<CoincidenceCalculator>,
}

impl Pipeline {
    async fn compute(
        &self,
        request: &ComputationRequest,
        cancel: &CancellationToken,
    ) -> Result<ComputationResult, CoincidenceError> {
        let join_record_id = request.join_record_id;

        let analysis = self
            .backend
            .fetch_join_record(join_record_id, request.analysis_id, request.composer_id)
            .await?;

        let composer = self.backend.fetch_composer_profile(request.composer_id).await?;

        debug!(
            composer_analysis_id = join_record_id,
            composer_id = composer.id,
            composer_slots = composer.interval_profile().populated_slots(),
            analysis_slots = analysis.interval_profile().populated_slots(),
            "Fetched join record and composer profile"
        );

        let score = self.calculator.calculate(&composer, &analysis, cancel).await?;

        Ok(ComputationResult::completed(join_record_id, score))
    }

    /// Async mode: compute, then deliver once. The guard is released when
    /// this future completes or is dropped.
    async fn run_and_deliver(
        self,
        request: ComputationRequest,
        cancel: CancellationToken,
        _guard: InFlightGuard,
    ) -> Result<ComputationResult, CoincidenceError> {
        let join_record_id = request.join_record_id;

        let result = match self.compute(&request, &cancel).await {
            Ok(result) => result,
            Err(CoincidenceError::Cancelled) => {
                warn!(
                    composer_analysis_id = join_record_id,
                    "Calculation cancelled before completion, no callback sent"
                );
                return Err(CoincidenceError::Cancelled);
            }
            Err(e) => {
                error!(
                    composer_analysis_id = join_record_id,
                    composer_id = request.composer_id,
                    error = %e,
                    "Coincidence calculation failed"
                );
                return Err(e);
            }
        };

        info!(
            composer_analysis_id = join_record_id,
            score = result.score,
            "Coincidence calculated, delivering result"
        );

        if let Err(e) = self.backend.deliver_result(&result).await {
            error!(
                composer_analysis_id = join_record_id,
                score = result.score,
                error = %e,
                "Failed to deliver result to backend"
            );
            return Err(e.into());
        }

        info!(composer_analysis_id = join_record_id, "Result delivered to backend");
        Ok(result)
    }
}

/// Owns in-flight state and background tasks for coincidence calculations
pub struct Coordinator {
    pipeline: Pipeline,
    secret: SharedSecret,
    in_flight: InFlightRegistry,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Coordinator {
    pub fn new(
        backend: Arc<dyn DataBackend>,
        calculator: Arc<CoincidenceCalculator>,
        secret: SharedSecret,
    ) -> Self {
        Self {
            pipeline: Pipeline { backend, calculator },
            secret,
            in_flight: InFlightRegistry::new(),
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Configured shared secret
    pub fn secret(&self) -> &SharedSecret {
        &self.secret
    }

    /// Request validation first, then the secret; no state is touched
    fn authorize(&self, request: &ComputationRequest) -> Result<(), CoincidenceError> {
        request.validate().map_err(CoincidenceError::InvalidRequest)?;
        self.secret.verify(&request.secret_key).map_err(|_| {
            warn!(
                composer_analysis_id = request.join_record_id,
                "Rejected request with invalid secret key"
            );
            CoincidenceError::Unauthorized
        })
    }

    /// Accept a request for background processing
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_async(&self, request: ComputationRequest) -> Result<Accepted, CoincidenceError> {
        self.authorize(&request)?;

        if self.shutdown.is_cancelled() {
            return Err(CoincidenceError::Cancelled);
        }

        let join_record_id = request.join_record_id;
        let guard = self.in_flight.try_acquire(join_record_id).ok_or_else(|| {
            info!(
                composer_analysis_id = join_record_id,
                "Duplicate request for analysis already in flight"
            );
            CoincidenceError::Conflict(join_record_id)
        })?;

        info!(
            composer_analysis_id = join_record_id,
            composer_id = request.composer_id,
            analysis_id = request.analysis_id,
            "Coincidence calculation accepted"
        );

        let pipeline = self.pipeline.clone();
        let cancel = self.shutdown.child_token();
        let task = self
            .tasks
            .spawn(pipeline.run_and_deliver(request, cancel, guard));

        Ok(Accepted {
            join_record_id,
            task,
        })
    }

    /// Compute inline and return the result
    ///
    /// Not deduplicated and never delivers a callback. `cancel` aborts the
    /// delay phase; dropping the returned future abandons the pipeline.
    pub async fn submit_sync(
        &self,
        request: ComputationRequest,
        cancel: &CancellationToken,
    ) -> Result<ComputationResult, CoincidenceError> {
        self.authorize(&request)?;

        let join_record_id = request.join_record_id;
        debug!(composer_analysis_id = join_record_id, "Synchronous calculation started");

        match self.pipeline.compute(&request, cancel).await {
            Ok(result) => {
                info!(
                    composer_analysis_id = join_record_id,
                    score = result.score,
                    "Synchronous calculation completed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    composer_analysis_id = join_record_id,
                    error = %e,
                    "Synchronous calculation failed"
                );
                Err(e)
            }
        }
    }

    /// Token cancelled on shutdown; children of it are suitable for
    /// [`Coordinator::submit_sync`]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, join_record_id: i64) -> bool {
        self.in_flight.contains(join_record_id)
    }

    /// Cancel every calculation still in its delay phase, sync ones included
    ///
    /// Returns immediately. New async submissions are refused afterwards and
    /// sync requests waiting on the delay fail with
    /// [`CoincidenceError::Cancelled`]. Idempotent.
    pub fn begin_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            info!(pending = self.tasks.len(), "Cancelling pending calculations");
            self.shutdown.cancel();
        }
    }

    /// [`Coordinator::begin_shutdown`], then wait for every background task
    pub async fn shutdown(&self) {
        self.begin_shutdown();
        self.tasks.close();
        self.tasks.wait().await;

        info!("Coordinator shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_maps_to_coincidence_error() {
        let err: CoincidenceError = CalculationCancelled.into();
        assert_eq!(err, CoincidenceError::Cancelled);
    }

    #[test]
    fn test_remote_error_is_transparent() {
        let err: CoincidenceError = RemoteError::Unavailable("connection refused".to_string()).into();
        assert_eq!(err.to_string(), "Backend unavailable: connection refused");
    }

    #[test]
    fn test_conflict_message_names_id() {
        assert_eq!(
            CoincidenceError::Conflict(42).to_string(),
            "Analysis 42 is already being processed"
        );
    }
}
