//! Application Entity and Status State Machine
//!
//! An application moves through a monotonic DAG:
//! `Pending -> Voting -> {Approved, Rejected, Expired}`, with the admin
//! override `Pending -> {Approved, Rejected}`. Terminal states never
//! transition further.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Voting,
    Approved,
    Rejected,
    Expired,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Voting => "voting",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "voting" => Some(ApplicationStatus::Voting),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            "expired" => Some(ApplicationStatus::Expired),
            _ => None,
        }
    }
}

/// Terminal outcome a resolution drives the application into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionOutcome {
    Approved,
    Rejected,
    Expired,
}

impl ResolutionOutcome {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            ResolutionOutcome::Approved => ApplicationStatus::Approved,
            ResolutionOutcome::Rejected => ApplicationStatus::Rejected,
            ResolutionOutcome::Expired => ApplicationStatus::Expired,
        }
    }

    /// Whether `from` may legally transition into this outcome.
    /// `Expired` only ever follows an elapsed voting window.
    pub fn permitted_from(&self, from: ApplicationStatus) -> bool {
        match self {
            ResolutionOutcome::Approved | ResolutionOutcome::Rejected => {
                matches!(from, ApplicationStatus::Pending | ApplicationStatus::Voting)
            }
            ResolutionOutcome::Expired => from == ApplicationStatus::Voting,
        }
    }
}

/// What triggered a resolution, carried into the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionCause {
    VoteTally,
    Manual,
    Expiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePolarity {
    Positive,
    Negative,
}

impl VotePolarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotePolarity::Positive => "positive",
            VotePolarity::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<VotePolarity> {
        match s {
            "positive" => Some(VotePolarity::Positive),
            "negative" => Some(VotePolarity::Negative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: i64,
    /// Roster name handed to Whitelist Sync on approval.
    pub nickname: String,
    /// Free-text justification from the candidate.
    pub reason: String,
    pub status: ApplicationStatus,
    /// Set exactly once, on entering `Voting`.
    pub deadline: Option<DateTime<Utc>>,
    /// Denormalized vote counters, written in the same transaction as the
    /// vote insert. Never recomputed out of band.
    pub positive_votes: u32,
    pub negative_votes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(candidate_id: i64, nickname: String, reason: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            nickname,
            reason,
            status: ApplicationStatus::Pending,
            deadline: None,
            positive_votes: 0,
            negative_votes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally {
            positive: self.positive_votes,
            negative: self.negative_votes,
        }
    }
}

/// A single immutable vote. Unique on (application_id, voter_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub application_id: Uuid,
    pub voter_id: i64,
    pub polarity: VotePolarity,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub positive: u32,
    pub negative: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.positive + self.negative
    }
}
