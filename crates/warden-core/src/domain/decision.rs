//! Decision model: does a repository need a (re-)check?
//!
//! Pure functions only. The scheduler gathers the inputs (record, latest
//! remote hash, in-flight membership, clock) and acts on the result.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{CommitHash, RepositoryRecord};

/// Why a task gets enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueReason {
    /// No record existed; a bare one was just created.
    NewRepository,

    /// Operator asked for a re-check regardless of the hash.
    Forced,

    /// The remote HEAD moved since the last check.
    Outdated,
}

/// Why nothing gets enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A check for the same url is queued or running. It converges to at
    /// least the hash that was current when it was enqueued.
    InFlight,

    /// Record hash equals the remote HEAD and no force was requested.
    UpToDate,

    /// Forced, but the last check is younger than the force cooldown.
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Enqueue(EnqueueReason),
    Skip(SkipReason),
}

impl Decision {
    pub fn is_enqueue(self) -> bool {
        matches!(self, Decision::Enqueue(_))
    }
}

/// Inputs for deciding about an existing record.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub record: &'a RepositoryRecord,
    pub latest: &'a CommitHash,
    pub force: bool,
    pub in_flight: bool,
    pub force_cooldown: Duration,
    pub now: DateTime<Utc>,
}

/// Decide for a record that already exists.
///
/// Order matters: in-flight dedup wins over everything, `force` only bypasses
/// the hash-freshness gate. An outdated record with `force` set yields one
/// enqueue, never two.
pub fn decide(input: DecisionInput<'_>) -> Decision {
    if input.in_flight {
        return Decision::Skip(SkipReason::InFlight);
    }

    let outdated = input.record.hash.as_ref() != Some(input.latest);

    if input.force {
        if !outdated && within_cooldown(input.record, input.force_cooldown, input.now) {
            return Decision::Skip(SkipReason::Cooldown);
        }
        return Decision::Enqueue(EnqueueReason::Forced);
    }

    if outdated {
        Decision::Enqueue(EnqueueReason::Outdated)
    } else {
        Decision::Skip(SkipReason::UpToDate)
    }
}

fn within_cooldown(record: &RepositoryRecord, cooldown: Duration, now: DateTime<Utc>) -> bool {
    if cooldown.is_zero() {
        return false;
    }
    let Some(last_access) = record.last_access else {
        return false;
    };
    match (now - last_access).to_std() {
        Ok(age) => age < cooldown,
        // last_access in the future: clock skew, treat as fresh
        Err(_) => true,
    }
}
