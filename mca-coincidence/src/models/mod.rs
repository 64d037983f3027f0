//! Domain models for coincidence computation

pub mod analysis;
pub mod composer;
pub mod computation;
pub mod interval;
mod wire;

pub use analysis::AnalysisRecord;
pub use composer::{ComposerProfile, IntervalStat};
pub use computation::{ComputationRequest, ComputationResult, ComputationStatus};
pub use interval::{IntervalGroup, IntervalProfile, RawFrequency, SlotStat, SLOT_COUNT};
