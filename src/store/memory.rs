//! In-Memory Store
//!
//! Backend used by tests and by deployments that disable PostgreSQL. A
//! single mutex over the whole state makes every mutating method a
//! serialized critical section, giving the same observable guarantees as
//! the transactional backend: duplicate suppression, idempotent resolution,
//! and lost-update-free counters.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::EngineError;
use crate::identity::{Role, User};
use crate::reputation::score::{RatingPolarity, ReputationRecord, ReputationScore};
use crate::store::{CastOutcome, RatingOutcome, ResolveOutcome, Store, SystemSettings};
use crate::voting::application::{
    Application, ApplicationStatus, ResolutionOutcome, Tally, Vote, VotePolarity,
};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    applications: HashMap<Uuid, Application>,
    votes: HashMap<(Uuid, i64), Vote>,
    ratings: Vec<ReputationRecord>,
    settings: Option<SystemSettings>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_eligible_voter(user: &User) -> bool {
    user.active && user.can_vote && matches!(user.role, Role::Member | Role::Admin)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_eligibility(
        &self,
        id: i64,
        role: Role,
        can_vote: bool,
    ) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or(EngineError::NotFound("user"))?;
        if user.role == role && user.can_vote == can_vote {
            return Ok(false);
        }
        user.role = role;
        user.can_vote = can_vote;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn count_eligible_voters(&self) -> Result<u32, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().filter(|u| is_eligible_voter(u)).count() as u32)
    }

    async fn list_eligible_voters(&self) -> Result<Vec<User>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .filter(|u| is_eligible_voter(u))
            .cloned()
            .collect())
    }

    async fn create_application(
        &self,
        candidate_id: i64,
        nickname: &str,
        reason: &str,
    ) -> Result<Application, EngineError> {
        let mut inner = self.inner.lock().await;
        let has_active = inner
            .applications
            .values()
            .any(|a| a.candidate_id == candidate_id && !a.status.is_terminal());
        if has_active {
            return Err(EngineError::DuplicateApplication);
        }
        let application = Application::new(candidate_id, nickname.to_string(), reason.to_string());
        inner.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner.applications.get(&id).cloned())
    }

    async fn find_active_by_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Option<Application>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .applications
            .values()
            .find(|a| a.candidate_id == candidate_id && !a.status.is_terminal())
            .cloned())
    }

    async fn start_voting(
        &self,
        id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<Application, EngineError> {
        let mut inner = self.inner.lock().await;
        let application = inner
            .applications
            .get_mut(&id)
            .ok_or(EngineError::NotFound("application"))?;
        if application.status != ApplicationStatus::Pending {
            return Err(EngineError::InvalidState(format!(
                "cannot start voting from {}",
                application.status.as_str()
            )));
        }
        application.status = ApplicationStatus::Voting;
        application.deadline = Some(deadline);
        application.updated_at = Utc::now();
        Ok(application.clone())
    }

    async fn resolve(
        &self,
        id: Uuid,
        outcome: ResolutionOutcome,
    ) -> Result<ResolveOutcome, EngineError> {
        let mut inner = self.inner.lock().await;
        let application = inner
            .applications
            .get_mut(&id)
            .ok_or(EngineError::NotFound("application"))?;
        if application.status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyResolved(application.clone()));
        }
        if !outcome.permitted_from(application.status) {
            return Err(EngineError::InvalidState(format!(
                "cannot resolve {} from {}",
                outcome.status().as_str(),
                application.status.as_str()
            )));
        }
        let previous = application.status;
        application.status = outcome.status();
        application.updated_at = Utc::now();
        Ok(ResolveOutcome::Resolved {
            application: application.clone(),
            previous,
        })
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Application>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .applications
            .values()
            .filter(|a| {
                a.status == ApplicationStatus::Voting
                    && a.deadline.map(|d| d <= now).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn cast_vote(
        &self,
        application_id: Uuid,
        voter_id: i64,
        polarity: VotePolarity,
    ) -> Result<CastOutcome, EngineError> {
        let mut inner = self.inner.lock().await;
        let status = inner
            .applications
            .get(&application_id)
            .map(|a| a.status)
            .ok_or(EngineError::NotFound("application"))?;
        if status != ApplicationStatus::Voting {
            return Err(EngineError::InvalidState(format!(
                "application is {}, not open for voting",
                status.as_str()
            )));
        }
        let key = (application_id, voter_id);
        if inner.votes.contains_key(&key) {
            return Ok(CastOutcome::AlreadyVoted);
        }
        inner.votes.insert(
            key,
            Vote {
                application_id,
                voter_id,
                polarity,
                cast_at: Utc::now(),
            },
        );
        // Counter increment shares the critical section with the insert.
        let application = inner
            .applications
            .get_mut(&application_id)
            .ok_or(EngineError::NotFound("application"))?;
        match polarity {
            VotePolarity::Positive => application.positive_votes += 1,
            VotePolarity::Negative => application.negative_votes += 1,
        }
        application.updated_at = Utc::now();
        Ok(CastOutcome::Recorded(application.tally()))
    }

    async fn tally(&self, application_id: Uuid) -> Result<Tally, EngineError> {
        let inner = self.inner.lock().await;
        inner
            .applications
            .get(&application_id)
            .map(|a| a.tally())
            .ok_or(EngineError::NotFound("application"))
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
        if weight == 0 {
            return Err(EngineError::InvalidState(
                "rating weight must be positive".to_string(),
            ));
        }
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let last = inner
            .ratings
            .iter()
            .filter(|r| r.rater_id == rater_id && r.target_id == target_id)
            .map(|r| r.rated_at)
            .max();
        if let Some(last) = last {
            let elapsed = now - last;
            if elapsed < cooldown {
                return Ok(RatingOutcome::Cooldown {
                    retry_after: cooldown - elapsed,
                });
            }
        }
        let record = ReputationRecord {
            id: Uuid::new_v4(),
            rater_id,
            target_id,
            polarity,
            reason: reason.map(|r| r.to_string()),
            weight,
            rated_at: now,
        };
        inner.ratings.push(record.clone());
        Ok(RatingOutcome::Recorded(record))
    }

    async fn score(&self, user_id: i64) -> Result<ReputationScore, EngineError> {
        let inner = self.inner.lock().await;
        let baseline = inner
            .users
            .get(&user_id)
            .ok_or(EngineError::NotFound("user"))?
            .amnesty_at;
        let mut positive = 0i64;
        let mut negative = 0i64;
        for record in inner.ratings.iter().filter(|r| r.target_id == user_id) {
            match record.polarity {
                RatingPolarity::Positive => positive += record.weight as i64,
                RatingPolarity::Negative => {
                    if baseline.map(|b| record.rated_at > b).unwrap_or(true) {
                        negative += record.weight as i64;
                    }
                }
            }
        }
        Ok(ReputationScore {
            user_id,
            positive,
            negative,
        })
    }

    async fn ratings_for(&self, target_id: i64) -> Result<Vec<ReputationRecord>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect())
    }

    async fn grant_amnesty(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(EngineError::NotFound("user"))?;
        user.amnesty_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn get_settings(&self) -> Result<SystemSettings, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner.settings.clone().unwrap_or_default())
    }

    async fn update_settings(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        inner.settings = Some(settings.clone());
        Ok(())
    }

    async fn seed_settings(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if inner.settings.is_none() {
            inner.settings = Some(settings.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_application_guard() {
        let store = MemoryStore::new();
        store.create_application(7, "seven", "let me in").await.unwrap();
        let second = store.create_application(7, "seven", "again").await;
        assert!(matches!(second, Err(EngineError::DuplicateApplication)));
    }

    #[tokio::test]
    async fn test_terminal_application_frees_the_slot() {
        let store = MemoryStore::new();
        let app = store.create_application(7, "seven", "first try").await.unwrap();
        store.resolve(app.id, ResolutionOutcome::Rejected).await.unwrap();
        assert!(store.find_active_by_candidate(7).await.unwrap().is_none());
        store.create_application(7, "seven", "second try").await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let store = MemoryStore::new();
        let app = store.create_application(7, "seven", "reason").await.unwrap();
        let first = store.resolve(app.id, ResolutionOutcome::Approved).await.unwrap();
        assert!(matches!(
            first,
            ResolveOutcome::Resolved {
                previous: ApplicationStatus::Pending,
                ..
            }
        ));
        let second = store.resolve(app.id, ResolutionOutcome::Rejected).await.unwrap();
        match second {
            ResolveOutcome::AlreadyResolved(a) => {
                assert_eq!(a.status, ApplicationStatus::Approved)
            }
            ResolveOutcome::Resolved { .. } => panic!("terminal application re-resolved"),
        }
    }

    #[tokio::test]
    async fn test_vote_requires_voting_status() {
        let store = MemoryStore::new();
        let app = store.create_application(7, "seven", "reason").await.unwrap();
        let result = store.cast_vote(app.id, 2, VotePolarity::Positive).await;
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_seed_does_not_clobber() {
        let store = MemoryStore::new();
        let mut tuned = SystemSettings::default();
        tuned.min_votes_required = 9;
        store.update_settings(&tuned).await.unwrap();
        store.seed_settings(&SystemSettings::default()).await.unwrap();
        assert_eq!(store.get_settings().await.unwrap().min_votes_required, 9);
    }
}
