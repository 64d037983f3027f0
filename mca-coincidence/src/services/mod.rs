//! Services for mca-coincidence

pub mod backend_client;
pub mod coordinator;
pub mod delay_policy;
mod in_flight;
pub mod random_source;
pub mod similarity;

pub use backend_client::{DataBackend, HttpBackendClient, RemoteError};
pub use coordinator::{Accepted, CoincidenceError, Coordinator};
pub use delay_policy::{ConstantDelay, DelayPolicy, UniformDelay};
pub use random_source::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use similarity::{
    fallback_score, weighted_similarity, CalculationCancelled, CoincidenceCalculator,
    FALLBACK_MAX, FALLBACK_MIN,
};
