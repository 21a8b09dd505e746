//! Threshold Resolver
//!
//! Pure tally arithmetic, no storage. Called after every committed vote and
//! by the expiration sweeper; resolution always recomputes from the
//! authoritative tally, never from a cached decision.

use serde::Serialize;

use crate::store::SystemSettings;
use crate::voting::application::Tally;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyDecision {
    Approve,
    Reject,
    /// Keep voting open: participation minimum not met, or neither side
    /// clears its percentage bar.
    Undecided,
}

/// Votes required before a tally may decide:
/// max(ceil(eligible * min_participation / 100), min_votes_required).
pub fn required_votes(eligible_voters: u32, settings: &SystemSettings) -> u32 {
    let participation =
        (eligible_voters as u64 * settings.min_participation_percent as u64).div_ceil(100) as u32;
    participation.max(settings.min_votes_required)
}

/// Map a tally to a decision. Integer arithmetic throughout so the result is
/// exact and deterministic: `positive/total >= approval%` is evaluated as
/// `positive * 100 >= approval * total`.
pub fn decide(tally: Tally, eligible_voters: u32, settings: &SystemSettings) -> TallyDecision {
    let total = tally.total();
    // An empty tally never decides, even under a zeroed-out policy; both
    // percentage comparisons hold vacuously at total 0.
    if total == 0 || total < required_votes(eligible_voters, settings) {
        return TallyDecision::Undecided;
    }

    let total = total as u64;
    if tally.positive as u64 * 100 >= settings.approval_threshold_percent as u64 * total {
        TallyDecision::Approve
    } else if tally.negative as u64 * 100 >= settings.rejection_threshold_percent as u64 * total {
        TallyDecision::Reject
    } else {
        TallyDecision::Undecided
    }
}
