//! In-flight tracking for async calculations
//!
//! At most one async calculation may run per join-record id. Membership is
//! held by an [`InFlightGuard`]; dropping the guard releases the id, so the
//! marker goes away on success, error, cancellation and panic alike.
//!
//! The lock is held only for the insert/remove itself, never across an
//! `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of join-record ids with a calculation in progress
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    ids: Arc<Mutex<HashSet<i64>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<i64>> {
        // The set stays consistent even if a holder panicked
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `id` unless already present
    ///
    /// Check and insert happen under one lock acquisition, so of two racing
    /// callers exactly one gets the guard.
    pub fn try_acquire(&self, id: i64) -> Option<InFlightGuard> {
        if self.lock().insert(id) {
            Some(InFlightGuard {
                registry: self.clone(),
                id,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, id: i64) {
        self.lock().remove(&id);
    }
}

/// Proof that a join-record id is registered as in flight
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(self.id);
        tracing::debug!(composer_analysis_id = self.id, "Released in-flight marker");
    }
}
