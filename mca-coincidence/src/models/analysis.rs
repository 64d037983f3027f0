//! Join record (composer ↔ analysis) as served by the backend

use serde::{Deserialize, Serialize};

use super::interval::{IntervalProfile, RawFrequency};

/// Association of one composer with one analysis, carrying the analysis-side
/// interval frequencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub composer_id: i64,
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub analysis_id: i64,
    #[serde(default)]
    pub anon_unisons_seconds_freq: Option<RawFrequency>,
    #[serde(default)]
    pub anon_thirds_freq: Option<RawFrequency>,
    #[serde(default)]
    pub anon_fourths_fifths_freq: Option<RawFrequency>,
    #[serde(default)]
    pub anon_sixths_sevenths_freq: Option<RawFrequency>,
    #[serde(default)]
    pub anon_octaves_freq: Option<RawFrequency>,
    /// Score currently stored by the backend (informational)
    #[serde(default)]
    pub potential_coincidence: Option<RawFrequency>,
}

impl AnalysisRecord {
    /// Parse the textual frequencies into a profile
    ///
    /// This is the only place analysis frequencies are parsed; absent and
    /// unparseable values both become empty slots.
    pub fn interval_profile(&self) -> IntervalProfile {
        let parse = |raw: &Option<RawFrequency>| raw.as_ref().and_then(RawFrequency::parse);

        IntervalProfile::from_frequencies([
            parse(&self.anon_unisons_seconds_freq),
            parse(&self.anon_thirds_freq),
            parse(&self.anon_fourths_fifths_freq),
            parse(&self.anon_sixths_sevenths_freq),
            parse(&self.anon_octaves_freq),
        ])
    }
}
