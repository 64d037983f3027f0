//! mca-coincidence library interface
//!
//! Scores how closely an analysis's interval frequencies match a composer's
//! historical profile and reports the score back to the backend.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::services::Coordinator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Limit for the sync endpoint; None waits indefinitely
    pub sync_deadline: Option<Duration>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, sync_deadline: Option<Duration>) -> Self {
        Self {
            coordinator,
            startup_time: Utc::now(),
            sync_deadline,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::coincidence_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
