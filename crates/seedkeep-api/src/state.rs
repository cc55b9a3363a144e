//! Shared state handed to every handler.
//!
//! # Design
//! - At most one promotion per info hash runs at a time; a second notification for the same
//!   hash is refused while the first is in flight.
//! - The in-flight ticket releases its hash on drop, so a panicking run cannot wedge it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use seedkeep_telemetry::Metrics;

use crate::promoter::Promoter;

/// State shared across requests.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) promoter: Arc<dyn Promoter>,
    pub(crate) watch_category: Arc<str>,
    pub(crate) metrics: Metrics,
    pub(crate) in_flight: InFlight,
}

impl ApiState {
    /// Bundle the promoter, watched category, and metrics registry.
    #[must_use]
    pub fn new(promoter: Arc<dyn Promoter>, watch_category: &str, metrics: Metrics) -> Self {
        Self {
            promoter,
            watch_category: Arc::from(watch_category),
            metrics,
            in_flight: InFlight::default(),
        }
    }
}

/// Set of info hashes currently being promoted.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    hashes: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.hashes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `hash`; `None` when a run for it is already active.
    pub(crate) fn claim(&self, hash: &str) -> Option<InFlightTicket> {
        let key = hash.to_ascii_lowercase();
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightTicket {
            owner: self.clone(),
            key,
        })
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, hash: &str) -> bool {
        self.lock().contains(&hash.to_ascii_lowercase())
    }
}

/// Releases its hash when dropped.
pub(crate) struct InFlightTicket {
    owner: InFlight,
    key: String,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.key);
    }
}
