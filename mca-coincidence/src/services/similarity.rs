//! Coincidence calculator
//!
//! Scores how closely an analysis's interval frequencies match a composer's
//! historical interval statistics.
//!
//! # Algorithm
//!
//! For every slot where the composer has a frequency and the analysis has a
//! parseable frequency:
//!
//! ```text
//! similarity = 1 - |analysis - composer| / 100
//! ```
//!
//! i.e. an absolute-difference penalty on a fixed 100-point scale (not a
//! ratio of the two values). Slots are combined as a weighted mean using
//! [`IntervalGroup::weight`], scaled to percent, clamped to [0, 100] and
//! rounded to two decimals.
//!
//! When no slot is comparable the score falls back to a random value in
//! [30, 70). The narrower range marks a low-confidence result and is kept as
//! is.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::delay_policy::DelayPolicy;
use super::random_source::RandomSource;
use crate::models::{AnalysisRecord, ComposerProfile, IntervalProfile};

/// Largest possible deviation between two percentages
const MAX_DEVIATION: f64 = 100.0;

/// Lower bound of the no-data fallback score
pub const FALLBACK_MIN: f64 = 30.0;

/// Exclusive upper bound of the no-data fallback score
pub const FALLBACK_MAX: f64 = 70.0;

/// Calculation abandoned before completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Calculation cancelled")]
pub struct CalculationCancelled;

/// Weighted similarity of two profiles in percent, or None when no slot has
/// data on both sides
///
/// Pure; the result is clamped to [0, 100] and rounded to two decimals.
pub fn weighted_similarity(composer: &IntervalProfile, analysis: &IntervalProfile) -> Option<f64> {
    let mut total_similarity = 0.0;
    let mut total_weight = 0.0;

    for (group, composer_slot) in composer.iter() {
        let (Some(expected), Some(observed)) = (composer_slot.frequency, analysis.frequency(group))
        else {
            continue;
        };

        let deviation = (observed - expected).abs();
        let similarity = 1.0 - deviation / MAX_DEVIATION;
        trace!(
            group = group.label(),
            expected,
            observed,
            similarity,
            "Compared interval slot"
        );

        total_similarity += similarity * group.weight();
        total_weight += group.weight();
    }

    if total_weight > 0.0 {
        let percent = (total_similarity / total_weight * 100.0).clamp(0.0, 100.0);
        Some(round_to_hundredths(percent))
    } else {
        None
    }
}

/// Fallback score for a uniform draw in [0, 1)
///
/// Truncated (not rounded) to two decimals so the result stays below
/// [`FALLBACK_MAX`].
pub fn fallback_score(unit: f64) -> f64 {
    let raw = FALLBACK_MIN + unit.clamp(0.0, 1.0) * (FALLBACK_MAX - FALLBACK_MIN);
    ((raw * 100.0).floor() / 100.0).min(FALLBACK_MAX - 0.01)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Similarity engine with injectable latency and randomness
pub struct CoincidenceCalculator {
    delay: Arc<dyn DelayPolicy>,
    random: Arc<dyn RandomSource>,
}

impl CoincidenceCalculator {
    pub fn new(delay: Arc<dyn DelayPolicy>, random: Arc<dyn RandomSource>) -> Self {
        Self { delay, random }
    }

    /// Score a composer against a join record, in [0, 100]
    pub fn score(&self, composer: &ComposerProfile, analysis: &AnalysisRecord) -> f64 {
        self.score_profiles(&composer.interval_profile(), &analysis.interval_profile())
    }

    /// Score two already-parsed profiles
    pub fn score_profiles(&self, composer: &IntervalProfile, analysis: &IntervalProfile) -> f64 {
        match weighted_similarity(composer, analysis) {
            Some(score) => score,
            None => {
                let score = fallback_score(self.random.next_unit());
                debug!(
                    composer_slots = composer.populated_slots(),
                    analysis_slots = analysis.populated_slots(),
                    score,
                    "No comparable interval data, using fallback score"
                );
                score
            }
        }
    }

    /// Score after the simulated computation delay
    ///
    /// Returns early with [`CalculationCancelled`] if `cancel` fires during
    /// the delay.
    pub async fn calculate(
        &self,
        composer: &ComposerProfile,
        analysis: &AnalysisRecord,
        cancel: &CancellationToken,
    ) -> Result<f64, CalculationCancelled> {
        let delay = self.delay.next_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Simulating computation delay");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(CalculationCancelled),
            }
        } else if cancel.is_cancelled() {
            return Err(CalculationCancelled);
        }

        Ok(self.score(composer, analysis))
    }
}
