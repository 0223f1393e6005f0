//! Confirmation gate for destructive batches
//!
//! Removing a delegate is destructive, so a batch containing any
//! `remove` request is held until the caller re-submits it with the
//! confirmation flag set. The gate is a pure predicate over the request
//! set plus that flag; it keeps no state between the two submissions.
//!
//! [`batch_fingerprint`] gives callers a stable token for the parsed
//! request set. A caller that hands the fingerprint to the operator and
//! requires it back before setting the flag guarantees that an edited
//! batch re-enters the awaiting state instead of executing stale
//! confirmations.

use crate::request::{DelegationRequest, RequestKind};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Where a batch stands with respect to confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GateState {
    /// Safe to execute.
    Confirmed,
    /// Contains removals and has not been confirmed; nothing may be
    /// executed yet.
    AwaitingConfirmation {
        /// Number of `remove` requests in the batch.
        removals: usize,
        /// Fingerprint the caller must echo back to confirm.
        fingerprint: String,
    },
}

/// Decide whether a batch may execute.
///
/// Batches with no `remove` requests are confirmed immediately.
#[must_use]
pub(crate) fn evaluate(requests: &[DelegationRequest], confirmed: bool) -> GateState {
    let removals = requests
        .iter()
        .filter(|r| r.kind == RequestKind::Remove)
        .count();

    if removals == 0 || confirmed {
        GateState::Confirmed
    } else {
        GateState::AwaitingConfirmation {
            removals,
            fingerprint: batch_fingerprint(requests),
        }
    }
}

/// Stable fingerprint of an ordered request set.
///
/// Two submissions of the same parsed batch produce the same value;
/// any edit (content or order) produces a different one.
#[must_use]
pub fn batch_fingerprint(requests: &[DelegationRequest]) -> String {
    let mut hasher = DefaultHasher::new();
    requests.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
