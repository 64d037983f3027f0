//! Composer profile as served by the backend

use serde::{Deserialize, Serialize};

use super::interval::{IntervalProfile, SlotStat, SLOT_COUNT};

/// One entry of a composer's `interval_stats` list
///
/// Keys are PascalCase on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalStat {
    #[serde(rename = "IntervalGroup", default, deserialize_with = "super::wire::null_as_default")]
    pub interval_group: String,
    #[serde(rename = "Frequency", default)]
    pub frequency: Option<f64>,
    #[serde(rename = "StdDev", default)]
    pub std_dev: Option<f64>,
}

/// Composer with historical interval-usage statistics
///
/// Apart from `id`, a `null` or missing field reads as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerProfile {
    pub id: i64,
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub analyzed_works: i64,
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub total_intervals: i64,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub polyphony_type: Option<String>,
    /// Per-group statistics, paired with slots by position
    #[serde(default, deserialize_with = "super::wire::null_as_default")]
    pub interval_stats: Vec<IntervalStat>,
}

impl ComposerProfile {
    /// Statistics mapped onto the five fixed slots
    ///
    /// Entry `i` fills slot `i`; `IntervalGroup` labels are informational and
    /// not used for matching. Missing trailing entries leave slots empty,
    /// extra entries are ignored.
    pub fn interval_profile(&self) -> IntervalProfile {
        let mut slots = [SlotStat::default(); SLOT_COUNT];
        for (slot, stat) in slots.iter_mut().zip(self.interval_stats.iter()) {
            *slot = SlotStat::new(stat.frequency, stat.std_dev);
        }
        IntervalProfile::new(slots)
    }
}
