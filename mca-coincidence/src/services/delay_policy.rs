//! Simulated computation latency
//!
//! The production service holds every calculation for a random 5–10 s to
//! emulate a slow external resource. The wait is a policy object so tests can
//! run with no delay at all.

use std::sync::Arc;
use std::time::Duration;

use super::random_source::RandomSource;

/// Chooses how long the next calculation waits before returning
pub trait DelayPolicy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Same delay every time
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantDelay(pub Duration);

impl ConstantDelay {
    /// No delay
    pub fn none() -> Self {
        Self(Duration::ZERO)
    }
}

impl DelayPolicy for ConstantDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// Uniformly distributed delay in [min, max)
pub struct UniformDelay {
    min: Duration,
    max: Duration,
    random: Arc<dyn RandomSource>,
}

impl UniformDelay {
    /// Bounds are swapped if given in the wrong order
    pub fn new(min: Duration, max: Duration, random: Arc<dyn RandomSource>) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, random }
    }
}

impl DelayPolicy for UniformDelay {
    fn next_delay(&self) -> Duration {
        let span = self.max - self.min;
        self.min + span.mul_f64(self.random.next_unit())
    }
}
