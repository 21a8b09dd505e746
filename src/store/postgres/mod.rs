//! PostgreSQL Store
//!
//! One repository per table, a thin [`PostgresStore`] implementing the
//! [`Store`] contract by delegation, and the sqlx error classification that
//! separates retryable infrastructure failures from terminal ones.

pub mod applications;
pub mod pool;
pub mod ratings;
pub mod settings;
pub mod users;
pub mod votes;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::EngineError;
use crate::identity::{Role, User};
use crate::reputation::score::{RatingPolarity, ReputationRecord, ReputationScore};
use crate::store::{CastOutcome, RatingOutcome, ResolveOutcome, Store, SystemSettings};
use crate::voting::application::{Application, ResolutionOutcome, Tally, VotePolarity};

use applications::ApplicationRepository;
use ratings::RatingRepository;
use settings::SettingsRepository;
use users::UserRepository;
use votes::VoteRepository;

/// Map a sqlx error onto the engine taxonomy. Serialization failures,
/// deadlocks, lock timeouts, and connection problems are transient and get
/// retried; everything else is a hard store failure.
pub(crate) fn classify(context: &str, err: sqlx::Error) -> EngineError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => EngineError::Transient(format!("{}: {}", context, err)),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // serialization_failure, deadlock_detected, lock_not_available,
            // query_canceled (statement timeout)
            Some("40001") | Some("40P01") | Some("55P03") | Some("57014") => {
                EngineError::Transient(format!("{}: {}", context, err))
            }
            _ => EngineError::Store(format!("{}: {}", context, err)),
        },
        _ => EngineError::Store(format!("{}: {}", context, err)),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

pub struct PostgresStore {
    users: UserRepository,
    applications: ApplicationRepository,
    votes: VoteRepository,
    ratings: RatingRepository,
    settings: SettingsRepository,
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            applications: ApplicationRepository::new(pool.clone()),
            votes: VoteRepository::new(pool.clone()),
            ratings: RatingRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn init_schema(&self) -> Result<(), EngineError> {
        pool::init_schema(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, EngineError> {
        self.users.get(id).await
    }

    async fn upsert_user(&self, user: &User) -> Result<(), EngineError> {
        self.users.upsert(user).await
    }

    async fn set_eligibility(
        &self,
        id: i64,
        role: Role,
        can_vote: bool,
    ) -> Result<bool, EngineError> {
        self.users.set_eligibility(id, role, can_vote).await
    }

    async fn count_eligible_voters(&self) -> Result<u32, EngineError> {
        self.users.count_eligible_voters().await
    }

    async fn list_eligible_voters(&self) -> Result<Vec<User>, EngineError> {
        self.users.list_eligible_voters().await
    }

    async fn create_application(
        &self,
        candidate_id: i64,
        nickname: &str,
        reason: &str,
    ) -> Result<Application, EngineError> {
        self.applications.create(candidate_id, nickname, reason).await
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, EngineError> {
        self.applications.get(id).await
    }

    async fn find_active_by_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Option<Application>, EngineError> {
        self.applications.find_active_by_candidate(candidate_id).await
    }

    async fn start_voting(
        &self,
        id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<Application, EngineError> {
        self.applications.start_voting(id, deadline).await
    }

    async fn resolve(
        &self,
        id: Uuid,
        outcome: ResolutionOutcome,
    ) -> Result<ResolveOutcome, EngineError> {
        self.applications.resolve(id, outcome).await
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Application>, EngineError> {
        self.applications.list_due(now).await
    }

    async fn cast_vote(
        &self,
        application_id: Uuid,
        voter_id: i64,
        polarity: VotePolarity,
    ) -> Result<CastOutcome, EngineError> {
        self.votes.cast(application_id, voter_id, polarity).await
    }

    async fn tally(&self, application_id: Uuid) -> Result<Tally, EngineError> {
        self.votes.tally(application_id).await
    }

    async fn insert_rating(
        &self,
        rater_id: i64,
        target_id: i64,
        polarity: RatingPolarity,
        reason: Option<&str>,
        weight: u32,
        cooldown: chrono::Duration,
    ) -> Result<RatingOutcome, EngineError> {
        self.ratings
            .insert(rater_id, target_id, polarity, reason, weight, cooldown)
            .await
    }

    async fn score(&self, user_id: i64) -> Result<ReputationScore, EngineError> {
        self.ratings.score(user_id).await
    }

    async fn ratings_for(&self, target_id: i64) -> Result<Vec<ReputationRecord>, EngineError> {
        self.ratings.ratings_for(target_id).await
    }

    async fn grant_amnesty(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.ratings.grant_amnesty(user_id, now).await
    }

    async fn get_settings(&self) -> Result<SystemSettings, EngineError> {
        self.settings.get().await
    }

    async fn update_settings(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        self.settings.update(settings).await
    }

    async fn seed_settings(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        self.settings.seed(settings).await
    }
}
