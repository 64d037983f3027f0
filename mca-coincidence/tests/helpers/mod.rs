//! Shared test helpers for mca-coincidence
//!
//! [`FakeBackend`] is an in-memory [`DataBackend`] with failure switches and a
//! record of everything delivered.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mca_common::api::{CoincidenceRequest, SharedSecret};
use mca_coincidence::models::{AnalysisRecord, ComposerProfile, ComputationRequest, ComputationResult};
use mca_coincidence::services::{
    CoincidenceCalculator, ConstantDelay, Coordinator, DataBackend, FixedRandom, RemoteError,
};
use serde_json::json;

pub const SECRET: &str = "music_analysis_secret_2024";

/// In-memory backend
#[derive(Default)]
pub struct FakeBackend {
    join_records: Mutex<HashMap<i64, AnalysisRecord>>,
    composers: Mutex<HashMap<i64, ComposerProfile>>,
    fetch_failure: Mutex<Option<RemoteError>>,
    delivery_failure: Mutex<Option<RemoteError>>,
    delivered: Mutex<Vec<ComputationResult>>,
    fetches: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed one join record and its composer
    pub fn with_pair(
        self: Arc<Self>,
        join_record_id: i64,
        composer: [Option<f64>; 5],
        analysis: [Option<&str>; 5],
    ) -> Arc<Self> {
        let composer_id = join_record_id * 10;
        self.composers
            .lock()
            .unwrap()
            .insert(composer_id, composer_profile(composer_id, composer));
        self.join_records.lock().unwrap().insert(
            join_record_id,
            analysis_record(join_record_id, composer_id, join_record_id * 100, analysis),
        );
        self
    }

    /// Make every fetch fail with `err`
    pub fn fail_fetches(&self, err: RemoteError) {
        *self.fetch_failure.lock().unwrap() = Some(err);
    }

    /// Make every delivery fail with `err`
    pub fn fail_deliveries(&self, err: RemoteError) {
        *self.delivery_failure.lock().unwrap() = Some(err);
    }

    pub fn delivered(&self) -> Vec<ComputationResult> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_fetch(&self) -> Result<(), RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.fetch_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str, id: i64) -> RemoteError {
    RemoteError::Rejected {
        status: Some(404),
        message: format!("{} {} not found", what, id),
    }
}

#[async_trait]
impl DataBackend for FakeBackend {
    async fn fetch_join_record(
        &self,
        join_record_id: i64,
        _analysis_id: i64,
        _composer_id: i64,
    ) -> Result<AnalysisRecord, RemoteError> {
        self.check_fetch()?;
        self.join_records
            .lock()
            .unwrap()
            .get(&join_record_id)
            .cloned()
            .ok_or_else(|| not_found("Join record", join_record_id))
    }

    async fn fetch_composer_profile(&self, composer_id: i64) -> Result<ComposerProfile, RemoteError> {
        self.check_fetch()?;
        self.composers
            .lock()
            .unwrap()
            .get(&composer_id)
            .cloned()
            .ok_or_else(|| not_found("Composer", composer_id))
    }

    async fn deliver_result(&self, result: &ComputationResult) -> Result<(), RemoteError> {
        if let Some(err) = self.delivery_failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.delivered.lock().unwrap().push(result.clone());
        Ok(())
    }
}

pub fn composer_profile(id: i64, frequencies: [Option<f64>; 5]) -> ComposerProfile {
    let groups = ["Unisons/Seconds", "Thirds", "Fourths/Fifths", "Sixths/Sevenths", "Octaves"];
    let stats: Vec<_> = groups
        .iter()
        .zip(frequencies)
        .map(|(group, freq)| json!({"IntervalGroup": group, "Frequency": freq, "StdDev": 1.0}))
        .collect();

    serde_json::from_value(json!({
        "id": id,
        "name": format!("Composer {}", id),
        "interval_stats": stats,
    }))
    .unwrap()
}

pub fn analysis_record(
    id: i64,
    composer_id: i64,
    analysis_id: i64,
    frequencies: [Option<&str>; 5],
) -> AnalysisRecord {
    let [unisons, thirds, fourths, sixths, octaves] = frequencies;
    serde_json::from_value(json!({
        "id": id,
        "composer_id": composer_id,
        "analysis_id": analysis_id,
        "anon_unisons_seconds_freq": unisons,
        "anon_thirds_freq": thirds,
        "anon_fourths_fifths_freq": fourths,
        "anon_sixths_sevenths_freq": sixths,
        "anon_octaves_freq": octaves,
    }))
    .unwrap()
}

/// Wire request for a join record seeded with [`FakeBackend::with_pair`]
pub fn wire_request(join_record_id: i64, secret: &str) -> CoincidenceRequest {
    CoincidenceRequest {
        composer_analysis_id: join_record_id,
        composer_id: join_record_id * 10,
        analysis_id: join_record_id * 100,
        secret_key: secret.to_string(),
    }
}

pub fn request(join_record_id: i64, secret: &str) -> ComputationRequest {
    wire_request(join_record_id, secret).into()
}

/// Coordinator over `backend` with a fixed delay and fallback draw of 0.5
pub fn coordinator(backend: Arc<FakeBackend>, delay: Duration) -> Arc<Coordinator> {
    let calculator = CoincidenceCalculator::new(
        Arc::new(ConstantDelay(delay)),
        Arc::new(FixedRandom::new(0.5)),
    );
    Arc::new(Coordinator::new(
        backend,
        Arc::new(calculator),
        SharedSecret::new(SECRET).unwrap(),
    ))
}

/// Composer and analysis both at 50% on every slot
pub const EVEN: [Option<f64>; 5] = [Some(50.0); 5];
pub const EVEN_TEXT: [Option<&str>; 5] = [Some("50.0"); 5];
