//! Reputation Engine
//!
//! Accumulates peer ratings, evaluates the ejection threshold after every
//! negative rating, and handles administrative amnesty. Ejection side
//! effects are gated on the demotion write actually changing the user row,
//! so crossing the threshold ejects exactly once no matter how many
//! qualifying ratings follow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::identity::{self, Actor, Role};
use crate::reputation::score::{self, RatingPolarity, ReputationRecord, ReputationScore};
use crate::retry::{with_backoff, RetryPolicy};
use crate::store::{RatingOutcome, Store};
use crate::sync::{Notifier, NotifyEvent, WhitelistSync};

/// Weight carried by every rating record. Kept on the record so future
/// weighting schemes only touch the write path.
const RATING_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RatingReceipt {
    pub record: ReputationRecord,
    pub score: ReputationScore,
    /// This rating pushed the target over the ejection bar and the ejection
    /// sequence ran.
    pub ejected: bool,
    /// False when the roster removal failed after the demotion committed.
    pub external_synced: bool,
}

pub struct ReputationEngine {
    store: Arc<dyn Store>,
    whitelist: Arc<dyn WhitelistSync>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl ReputationEngine {
    pub fn new(
        store: Arc<dyn Store>,
        whitelist: Arc<dyn WhitelistSync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            whitelist,
            notifier,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn actor(&self, user_id: i64) -> Result<Actor, EngineError> {
        identity::resolve_actor(self.store.as_ref(), user_id).await
    }

    /// Submit one rating. Eligibility mirrors voting eligibility; the
    /// per-rater-per-target cooldown is enforced atomically with the insert.
    pub async fn rate(
        &self,
        actor: &Actor,
        target_id: i64,
        polarity: RatingPolarity,
        reason: Option<&str>,
    ) -> Result<RatingReceipt, EngineError> {
        if !actor.can_vote {
            return Err(EngineError::NotEligible(
                "rating requires an eligible member",
            ));
        }
        if actor.user_id == target_id {
            return Err(EngineError::SelfAction("rate"));
        }

        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or(EngineError::NotFound("user"))?;
        if !target.active {
            return Err(EngineError::InvalidState(
                "target account is deactivated".to_string(),
            ));
        }

        let settings = self.store.get_settings().await?;
        let outcome = with_backoff(&self.retry, "insert_rating", || {
            self.store.insert_rating(
                actor.user_id,
                target_id,
                polarity,
                reason,
                RATING_WEIGHT,
                settings.rating_cooldown(),
            )
        })
        .await?;

        let record = match outcome {
            RatingOutcome::Cooldown { retry_after } => {
                return Err(EngineError::Cooldown { retry_after });
            }
            RatingOutcome::Recorded(record) => record,
        };
        debug!(
            rater_id = actor.user_id,
            target_id = target_id,
            polarity = polarity.as_str(),
            "Rating recorded"
        );

        let score = self.store.score(target_id).await?;
        let mut ejected = false;
        let mut external_synced = true;

        if polarity == RatingPolarity::Negative {
            let eligible = self.store.count_eligible_voters().await?;
            if score::ejection_due(score.negative, eligible, &settings) {
                (ejected, external_synced) = self.eject(target_id, &target.handle).await?;
            }
        }

        Ok(RatingReceipt {
            record,
            score,
            ejected,
            external_synced,
        })
    }

    pub async fn score(&self, user_id: i64) -> Result<ReputationScore, EngineError> {
        self.store.score(user_id).await
    }

    /// Full rating history for audit; includes pre-amnesty records.
    pub async fn history(&self, user_id: i64) -> Result<Vec<ReputationRecord>, EngineError> {
        self.store.ratings_for(user_id).await
    }

    pub async fn check_ejection(&self, user_id: i64) -> Result<bool, EngineError> {
        let score = self.store.score(user_id).await?;
        let settings = self.store.get_settings().await?;
        let eligible = self.store.count_eligible_voters().await?;
        Ok(score::ejection_due(score.negative, eligible, &settings))
    }

    /// Admin resets the target's negative aggregate by moving the baseline
    /// to `now`. Records stay in place for audit; only ratings after the
    /// baseline count from here on.
    pub async fn amnesty(
        &self,
        actor: &Actor,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ReputationScore, EngineError> {
        if !actor.can_manage {
            return Err(EngineError::NotEligible(
                "amnesty requires an administrator",
            ));
        }

        with_backoff(&self.retry, "grant_amnesty", || {
            self.store.grant_amnesty(user_id, now)
        })
        .await?;

        info!(
            user_id = user_id,
            actor_id = actor.user_id,
            baseline = %now,
            "Amnesty granted, negative aggregate reset"
        );
        self.notifier.notify(user_id, NotifyEvent::AmnestyGranted).await;
        self.store.score(user_id).await
    }

    /// Demote and remove from the roster. Returns (ejected, external_synced).
    /// The `set_eligibility` change-detection is the exactly-once guard: a
    /// target already demoted by a previous qualifying rating reports no
    /// change, and no side effects run.
    async fn eject(&self, target_id: i64, handle: &str) -> Result<(bool, bool), EngineError> {
        let changed = with_backoff(&self.retry, "demote_member", || {
            self.store.set_eligibility(target_id, Role::Applicant, false)
        })
        .await?;
        if !changed {
            debug!(user_id = target_id, "Ejection threshold met but user already demoted");
            return Ok((false, true));
        }

        info!(user_id = target_id, "Negative reputation threshold crossed, ejecting member");

        let mut external_synced = true;
        if let Err(e) = self
            .whitelist
            .remove(handle, &target_id.to_string())
            .await
        {
            warn!(
                user_id = target_id,
                error = %e,
                "Whitelist removal failed after ejection, demotion stands"
            );
            external_synced = false;
        }
        self.notifier.notify(target_id, NotifyEvent::Ejected).await;

        Ok((true, external_synced))
    }
}
