//! Backend (system of record) client
//!
//! The coordinator depends only on [`DataBackend`]: two reads and one
//! callback write. [`HttpBackendClient`] is the production implementation
//! against the Django REST API.
//!
//! | Operation | Request |
//! |---|---|
//! | join record | `GET {base}/api/composer-analysis/{id}/?analysis_id=&composer_id=` |
//! | composer | `GET {base}/api/composers/{id}/` |
//! | callback | `POST {base}/api/analysis-callback/` |
//!
//! No call is retried.

use std::time::Duration;

use async_trait::async_trait;
use mca_common::api::SharedSecret;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{AnalysisRecord, ComposerProfile, ComputationResult};

const USER_AGENT: &str = concat!("mca-coincidence/", env!("CARGO_PKG_VERSION"));

/// Remote call failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Backend unreachable, timed out, or failing (5xx)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered but refused the request or sent an unusable payload
    #[error("Backend rejected request{}: {message}", status_suffix(.status))]
    Rejected { status: Option<u16>, message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl RemoteError {
    fn from_status(status: StatusCode, body: String) -> Self {
        let message = if body.is_empty() {
            status.canonical_reason().unwrap_or("no reason").to_string()
        } else {
            body
        };

        if status.is_server_error() {
            RemoteError::Unavailable(format!("HTTP {}: {}", status.as_u16(), message))
        } else {
            RemoteError::Rejected {
                status: Some(status.as_u16()),
                message,
            }
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Rejected {
                status: None,
                message: format!("Undecodable response: {}", err),
            }
        } else {
            RemoteError::Unavailable(err.to_string())
        }
    }
}

/// Remote data provider used by the coordinator
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Fetch the join record carrying the analysis-side frequencies
    async fn fetch_join_record(
        &self,
        join_record_id: i64,
        analysis_id: i64,
        composer_id: i64,
    ) -> Result<AnalysisRecord, RemoteError>;

    /// Fetch the composer with historical interval statistics
    async fn fetch_composer_profile(&self, composer_id: i64) -> Result<ComposerProfile, RemoteError>;

    /// Push a finished score back to the backend (single attempt)
    async fn deliver_result(&self, result: &ComputationResult) -> Result<(), RemoteError>;
}

/// HTTP client for the Django backend
pub struct HttpBackendClient {
    http_client: reqwest::Client,
    base_url: String,
    secret: SharedSecret,
}

impl HttpBackendClient {
    /// Create a client
    ///
    /// `secret` is the value sent in callback payloads. A trailing `/` on
    /// `base_url` is ignored.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        secret: SharedSecret,
    ) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
            secret,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn callback_url(&self) -> String {
        format!("{}/api/analysis-callback/", self.base_url)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status, body));
        }
        response.json::<T>().await.map_err(RemoteError::from_transport)
    }
}

#[async_trait]
impl DataBackend for HttpBackendClient {
    async fn fetch_join_record(
        &self,
        join_record_id: i64,
        analysis_id: i64,
        composer_id: i64,
    ) -> Result<AnalysisRecord, RemoteError> {
        let url = format!("{}/api/composer-analysis/{}/", self.base_url, join_record_id);

        tracing::debug!(url = %url, analysis_id, composer_id, "Fetching join record");

        let response = self
            .http_client
            .get(&url)
            .query(&[("analysis_id", analysis_id), ("composer_id", composer_id)])
            .send()
            .await
            .map_err(RemoteError::from_transport)?;

        Self::read_json(response).await
    }

    async fn fetch_composer_profile(&self, composer_id: i64) -> Result<ComposerProfile, RemoteError> {
        let url = format!("{}/api/composers/{}/", self.base_url, composer_id);

        tracing::debug!(url = %url, "Fetching composer profile");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(RemoteError::from_transport)?;

        Self::read_json(response).await
    }

    async fn deliver_result(&self, result: &ComputationResult) -> Result<(), RemoteError> {
        let url = self.callback_url();
        let payload = result.to_callback(&self.secret);

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(RemoteError::from_transport)?;

        // The backend acknowledges with 200 exactly
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status, body));
        }

        Ok(())
    }
}
