//! Persistence Contract
//!
//! The engines talk to a [`Store`] trait instead of a concrete database so
//! the core stays persistence-agnostic. Two backends exist: PostgreSQL
//! (production) and in-memory (tests, and the fallback when PostgreSQL is
//! disabled in configuration).
//!
//! Every mutating method is a single atomic unit on the backend: the
//! duplicate checks, status checks, and counter increments it describes
//! happen under one transaction/row lock, never as a read-then-write from
//! the caller's side.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::identity::{Role, User};
use crate::reputation::score::{RatingPolarity, ReputationRecord, ReputationScore};
use crate::voting::application::{Application, ResolutionOutcome, Tally, VotePolarity};

/// Singleton settings row read by the resolver and the sweeper, mutated only
/// through admin actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Length of the voting window opened by `start_voting`.
    pub voting_window_minutes: i64,
    /// Absolute floor on votes before a tally may decide.
    pub min_votes_required: u32,
    /// Participation floor as a percentage of eligible voters.
    pub min_participation_percent: u32,
    pub approval_threshold_percent: u32,
    pub rejection_threshold_percent: u32,
    /// Negative aggregate (as % of eligible voters) at which a member is
    /// ejected.
    pub negative_ratings_threshold_percent: u32,
    /// Per-rater-per-target cooldown between ratings.
    pub rating_cooldown_minutes: i64,
    pub updated_at: DateTime<Utc>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            voting_window_minutes: 3 * 24 * 60,
            min_votes_required: 3,
            min_participation_percent: 40,
            approval_threshold_percent: 60,
            rejection_threshold_percent: 60,
            negative_ratings_threshold_percent: 30,
            rating_cooldown_minutes: 24 * 60,
            updated_at: Utc::now(),
        }
    }
}

impl SystemSettings {
    pub fn voting_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.voting_window_minutes)
    }

    pub fn rating_cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.rating_cooldown_minutes)
    }
}

/// Result of an idempotent resolution attempt. A second attempt on an
/// already-terminal application reports `AlreadyResolved`; the caller skips
/// side effects and treats it as success. `previous` feeds the transition
/// audit log.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Resolved {
        application: Application,
        previous: crate::voting::application::ApplicationStatus,
    },
    AlreadyResolved(Application),
}

/// Result of a vote insert. The unique (application, voter) constraint is
/// the source of truth for duplicate suppression.
#[derive(Debug, Clone)]
pub enum CastOutcome {
    /// Vote recorded; carries the post-commit tally.
    Recorded(Tally),
    AlreadyVoted,
}

/// Result of a rating insert with the cooldown check applied atomically.
#[derive(Debug, Clone)]
pub enum RatingOutcome {
    Recorded(ReputationRecord),
    Cooldown { retry_after: chrono::Duration },
}

#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----

    async fn get_user(&self, id: i64) -> Result<Option<User>, EngineError>;

    async fn upsert_user(&self, user: &User) -> Result<(), EngineError>;

    /// Set role and voting flag in one write. Returns `true` only when the
    /// row actually changed; the reputation engine gates ejection side
    /// effects on this so a user is ejected exactly once.
    async fn set_eligibility(
        &self,
        id: i64,
        role: Role,
        can_vote: bool,
    ) -> Result<bool, EngineError>;

    async fn count_eligible_voters(&self) -> Result<u32, EngineError>;

    async fn list_eligible_voters(&self) -> Result<Vec<User>, EngineError>;

    // ---- applications ----

    /// Duplicate guard and insert are one atomic unit: fails with
    /// `DuplicateApplication` if the candidate already has a pending or
    /// voting application.
    async fn create_application(
        &self,
        candidate_id: i64,
        nickname: &str,
        reason: &str,
    ) -> Result<Application, EngineError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, EngineError>;

    async fn find_active_by_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Option<Application>, EngineError>;

    /// `Pending -> Voting`, setting the deadline. `InvalidState` from any
    /// other status.
    async fn start_voting(
        &self,
        id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<Application, EngineError>;

    /// Idempotent terminal transition. Serializes concurrent attempts so
    /// exactly one caller observes `Resolved`.
    async fn resolve(
        &self,
        id: Uuid,
        outcome: ResolutionOutcome,
    ) -> Result<ResolveOutcome, EngineError>;

    /// Applications in `Voting` whose deadline has elapsed.
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Application>, EngineError>;

    // ---- votes ----

    /// Status check, vote insert, and counter increment in one atomic unit.
    /// Concurrent votes from different voters must not lose updates.
    async fn cast_vote(
        &self,
        application_id: Uuid,
        voter_id: i64,
        polarity: VotePolarity,
    ) -> Result<CastOutcome, EngineError>;

    async fn tally(&self, application_id: Uuid) -> Result<Tally, EngineError>;

    // ---- reputation ----

    /// Cooldown check and insert in one atomic unit.
    async fn insert_rating(
        &self,
        rater_id: i64,
        target_id: i64,
        polarity: RatingPolarity,
        reason: Option<&str>,
        weight: u32,
        cooldown: chrono::Duration,
    ) -> Result<RatingOutcome, EngineError>;

    /// Weighted aggregates; the negative side only counts records after the
    /// user's amnesty baseline.
    async fn score(&self, user_id: i64) -> Result<ReputationScore, EngineError>;

    /// Full rating history against a user, amnesty-or-not, for audit.
    async fn ratings_for(&self, target_id: i64) -> Result<Vec<ReputationRecord>, EngineError>;

    /// Move the user's negative baseline to `now`.
    async fn grant_amnesty(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), EngineError>;

    // ---- settings ----

    async fn get_settings(&self) -> Result<SystemSettings, EngineError>;

    async fn update_settings(&self, settings: &SystemSettings) -> Result<(), EngineError>;

    /// Write the settings row only if none exists yet; restarts must not
    /// clobber admin-tuned values.
    async fn seed_settings(&self, settings: &SystemSettings) -> Result<(), EngineError>;
}
