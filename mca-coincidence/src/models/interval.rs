//! Interval groups and interval-frequency profiles
//!
//! A profile always has exactly five slots, one per [`IntervalGroup`], in the
//! fixed order of [`IntervalGroup::ALL`]. Composer statistics and analysis
//! observations are paired slot by slot, so the order is part of the data
//! contract with the backend.

use serde::{Deserialize, Serialize};

/// Number of interval slots in every profile
pub const SLOT_COUNT: usize = 5;

/// Musical interval category used as the unit of comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalGroup {
    UnisonsSeconds,
    Thirds,
    FourthsFifths,
    SixthsSevenths,
    Octaves,
}

impl IntervalGroup {
    /// All groups in slot order
    pub const ALL: [IntervalGroup; SLOT_COUNT] = [
        IntervalGroup::UnisonsSeconds,
        IntervalGroup::Thirds,
        IntervalGroup::FourthsFifths,
        IntervalGroup::SixthsSevenths,
        IntervalGroup::Octaves,
    ];

    /// Slot position in a profile
    pub const fn index(self) -> usize {
        match self {
            IntervalGroup::UnisonsSeconds => 0,
            IntervalGroup::Thirds => 1,
            IntervalGroup::FourthsFifths => 2,
            IntervalGroup::SixthsSevenths => 3,
            IntervalGroup::Octaves => 4,
        }
    }

    /// Contribution of this group to the coincidence score (weights sum to 1.0)
    pub const fn weight(self) -> f64 {
        match self {
            IntervalGroup::UnisonsSeconds => 0.25,
            IntervalGroup::Thirds => 0.20,
            IntervalGroup::FourthsFifths => 0.20,
            IntervalGroup::SixthsSevenths => 0.20,
            IntervalGroup::Octaves => 0.15,
        }
    }

    /// Human-readable name, used in per-slot trace logs
    pub const fn label(self) -> &'static str {
        match self {
            IntervalGroup::UnisonsSeconds => "unisons/seconds",
            IntervalGroup::Thirds => "thirds",
            IntervalGroup::FourthsFifths => "fourths/fifths",
            IntervalGroup::SixthsSevenths => "sixths/sevenths",
            IntervalGroup::Octaves => "octaves",
        }
    }
}

/// Frequency value as it arrives on the wire
///
/// The backend stores analysis frequencies as decimal text, but a numeric
/// JSON value is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFrequency {
    Number(f64),
    Text(String),
}

impl RawFrequency {
    /// Parse to a usable percentage
    ///
    /// Unparseable text and non-finite numbers yield None ("no data"), never
    /// an error. Text is not trimmed.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            RawFrequency::Number(n) => *n,
            RawFrequency::Text(s) => s.parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawFrequency {
    fn from(value: f64) -> Self {
        RawFrequency::Number(value)
    }
}

impl From<&str> for RawFrequency {
    fn from(value: &str) -> Self {
        RawFrequency::Text(value.to_string())
    }
}

/// Statistics for one interval slot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotStat {
    /// Mean frequency in percent
    pub frequency: Option<f64>,
    /// Standard deviation of the frequency
    pub std_dev: Option<f64>,
}

impl SlotStat {
    /// Build a slot, dropping non-finite values
    pub fn new(frequency: Option<f64>, std_dev: Option<f64>) -> Self {
        Self {
            frequency: frequency.filter(|f| f.is_finite()),
            std_dev: std_dev.filter(|s| s.is_finite()),
        }
    }
}

/// Five-slot interval-frequency profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalProfile {
    slots: [SlotStat; SLOT_COUNT],
}

impl IntervalProfile {
    pub fn new(slots: [SlotStat; SLOT_COUNT]) -> Self {
        Self {
            slots: slots.map(|s| SlotStat::new(s.frequency, s.std_dev)),
        }
    }

    /// Profile with frequencies only (no deviations)
    pub fn from_frequencies(frequencies: [Option<f64>; SLOT_COUNT]) -> Self {
        Self::new(frequencies.map(|f| SlotStat::new(f, None)))
    }

    pub fn slot(&self, group: IntervalGroup) -> &SlotStat {
        &self.slots[group.index()]
    }

    pub fn frequency(&self, group: IntervalGroup) -> Option<f64> {
        self.slot(group).frequency
    }

    /// Slots paired with their group, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (IntervalGroup, &SlotStat)> {
        IntervalGroup::ALL.into_iter().zip(self.slots.iter())
    }

    /// Number of slots that carry a frequency
    pub fn populated_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.frequency.is_some()).count()
    }
}
