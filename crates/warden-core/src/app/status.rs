//! Status - counters for observability.
//!
//! Nothing here takes part in correctness decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::runner::RunOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Waiting for a runner.
    pub queued: usize,

    /// Handed to a runner, check not finished.
    pub running: usize,

    /// Checks whose result reached the store.
    pub checked: u64,

    /// Checks that ended without touching the record.
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct RunStats {
    checked: AtomicU64,
    failed: AtomicU64,
}

impl RunStats {
    pub(crate) fn record(&self, outcome: &RunOutcome) {
        let counter = if outcome.is_applied() {
            &self.checked
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn checked(&self) -> u64 {
        self.checked.load(Ordering::Relaxed)
    }

    pub(crate) fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}
