//! Voting Engine - Application Lifecycle Orchestrator
//!
//! Stateless between calls: every operation takes the resolved actor and all
//! context explicitly, runs its mutation through the store's atomic
//! primitives with the uniform retry policy, and fires external side effects
//! only after the core transition has committed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::identity::{self, Actor, Role, User};
use crate::retry::{with_backoff, RetryPolicy};
use crate::store::{CastOutcome, ResolveOutcome, Store};
use crate::sync::{Notifier, NotifyEvent, WhitelistSync};
use crate::voting::application::{
    Application, ResolutionCause, ResolutionOutcome, Tally, VotePolarity,
};
use crate::voting::resolver::{self, TallyDecision};

/// Outcome of a committed vote: the post-commit tally, the resolver's
/// decision on it, and the resolution this vote triggered, if any.
#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub application_id: Uuid,
    pub tally: Tally,
    pub decision: TallyDecision,
    pub resolution: Option<ResolutionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    pub application: Application,
    pub cause: ResolutionCause,
    /// False when the roster mutation failed after the decision committed
    /// (degraded success; the decision stands).
    pub external_synced: bool,
}

/// How a resolution attempt ended for this caller.
#[derive(Debug, Clone)]
pub enum ResolveDisposition {
    Resolved(ResolutionSummary),
    /// Another caller got there first; no side effects were performed.
    AlreadyResolved(Application),
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub approved: usize,
    pub rejected: usize,
    pub expired: usize,
    /// Already resolved by a concurrent vote or sweep.
    pub skipped: usize,
    pub failed: usize,
}

pub struct VotingEngine {
    store: Arc<dyn Store>,
    whitelist: Arc<dyn WhitelistSync>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl VotingEngine {
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

    /// Candidate submits an application. Creates the applicant's user record
    /// on first contact; the duplicate-application guard lives in the store.
    pub async fn submit_application(
        &self,
        candidate_id: i64,
        nickname: &str,
        reason: &str,
    ) -> Result<Application, EngineError> {
        match self.store.get_user(candidate_id).await? {
            Some(user) if !user.active => {
                return Err(EngineError::InvalidState(
                    "candidate account is deactivated".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                let user = User::new(candidate_id, nickname.to_string());
                self.store.upsert_user(&user).await?;
            }
        }

        let application = with_backoff(&self.retry, "create_application", || {
            self.store.create_application(candidate_id, nickname, reason)
        })
        .await?;

        info!(
            application_id = %application.id,
            candidate_id = candidate_id,
            nickname = %nickname,
            "Application submitted"
        );
        Ok(application)
    }

    /// Admin opens the voting window: `Pending -> Voting` with
    /// `deadline = now + configured window`, then fans the poll out to
    /// eligible voters.
    pub async fn start_voting(
        &self,
        actor: &Actor,
        application_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Application, EngineError> {
        if !actor.can_manage {
            return Err(EngineError::NotEligible(
                "starting a vote requires an administrator",
            ));
        }

        let settings = self.store.get_settings().await?;
        let deadline = now + settings.voting_window();
        let application = with_backoff(&self.retry, "start_voting", || {
            self.store.start_voting(application_id, deadline)
        })
        .await?;

        info!(
            application_id = %application.id,
            candidate_id = application.candidate_id,
            actor_id = actor.user_id,
            previous = "pending",
            status = application.status.as_str(),
            deadline = %deadline,
            "Voting opened"
        );

        for voter in self.store.list_eligible_voters().await? {
            if voter.id == application.candidate_id {
                continue;
            }
            self.notifier
                .notify(
                    voter.id,
                    NotifyEvent::VotingOpened {
                        application_id: application.id,
                        nickname: application.nickname.clone(),
                    },
                )
                .await;
        }

        Ok(application)
    }

    /// Cast one vote, then re-evaluate the post-commit tally. A decisive
    /// tally resolves the application in the same call.
    pub async fn cast_vote(
        &self,
        actor: &Actor,
        application_id: Uuid,
        polarity: VotePolarity,
    ) -> Result<VoteReceipt, EngineError> {
        if !actor.can_vote {
            return Err(EngineError::NotEligible(
                "voting requires an eligible member",
            ));
        }

        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or(EngineError::NotFound("application"))?;
        if actor.user_id == application.candidate_id {
            return Err(EngineError::SelfAction("vote on"));
        }

        let outcome = with_backoff(&self.retry, "cast_vote", || {
            self.store.cast_vote(application_id, actor.user_id, polarity)
        })
        .await?;

        let tally = match outcome {
            CastOutcome::AlreadyVoted => return Err(EngineError::AlreadyVoted),
            CastOutcome::Recorded(tally) => tally,
        };
        debug!(
            application_id = %application_id,
            voter_id = actor.user_id,
            polarity = polarity.as_str(),
            positive = tally.positive,
            negative = tally.negative,
            "Vote recorded"
        );

        // Evaluate against the committed tally, never a stale read.
        let settings = self.store.get_settings().await?;
        let eligible = self.store.count_eligible_voters().await?;
        let decision = resolver::decide(tally, eligible, &settings);

        let resolution = match decision {
            TallyDecision::Undecided => None,
            TallyDecision::Approve => self
                .finalize(
                    application_id,
                    ResolutionOutcome::Approved,
                    ResolutionCause::VoteTally,
                )
                .await?
                .into_summary(),
            TallyDecision::Reject => self
                .finalize(
                    application_id,
                    ResolutionOutcome::Rejected,
                    ResolutionCause::VoteTally,
                )
                .await?
                .into_summary(),
        };

        Ok(VoteReceipt {
            application_id,
            tally,
            decision,
            resolution,
        })
    }

    /// Admin decides directly, from `Pending` or mid-vote. Expiry is driven
    /// by the deadline only and cannot be forced here.
    pub async fn admin_resolve(
        &self,
        actor: &Actor,
        application_id: Uuid,
        outcome: ResolutionOutcome,
    ) -> Result<ResolveDisposition, EngineError> {
        if !actor.can_manage {
            return Err(EngineError::NotEligible(
                "resolving an application requires an administrator",
            ));
        }
        if outcome == ResolutionOutcome::Expired {
            return Err(EngineError::InvalidState(
                "expiry is driven by the voting deadline".to_string(),
            ));
        }
        self.finalize(application_id, outcome, ResolutionCause::Manual)
            .await
    }

    pub async fn application_status(
        &self,
        application_id: Uuid,
    ) -> Result<Application, EngineError> {
        self.store
            .get_application(application_id)
            .await?
            .ok_or(EngineError::NotFound("application"))
    }

    pub async fn active_application(
        &self,
        candidate_id: i64,
    ) -> Result<Option<Application>, EngineError> {
        self.store.find_active_by_candidate(candidate_id).await
    }

    pub async fn tally(&self, application_id: Uuid) -> Result<Tally, EngineError> {
        self.store.tally(application_id).await
    }

    /// Force resolution of every application whose voting window has
    /// elapsed. One item's failure never aborts the batch; anything left
    /// unresolved is retried by the next sweep.
    pub async fn sweep_due(&self, now: DateTime<Utc>) -> Result<SweepReport, EngineError> {
        let due = self.store.list_due(now).await?;
        let mut report = SweepReport {
            scanned: due.len(),
            ..SweepReport::default()
        };
        if due.is_empty() {
            return Ok(report);
        }

        let settings = self.store.get_settings().await?;
        let eligible = self.store.count_eligible_voters().await?;

        for application in due {
            let outcome = match resolver::decide(application.tally(), eligible, &settings) {
                TallyDecision::Approve => ResolutionOutcome::Approved,
                TallyDecision::Reject => ResolutionOutcome::Rejected,
                // Still undecided at the deadline: the window closes empty.
                TallyDecision::Undecided => ResolutionOutcome::Expired,
            };
            match self
                .finalize(application.id, outcome, ResolutionCause::Expiry)
                .await
            {
                Ok(ResolveDisposition::Resolved(_)) => match outcome {
                    ResolutionOutcome::Approved => report.approved += 1,
                    ResolutionOutcome::Rejected => report.rejected += 1,
                    ResolutionOutcome::Expired => report.expired += 1,
                },
                Ok(ResolveDisposition::AlreadyResolved(_)) => report.skipped += 1,
                Err(e) => {
                    error!(
                        application_id = %application.id,
                        error = %e,
                        "Sweep failed to resolve application, leaving for next pass"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Terminal transition plus post-commit side effects. The store
    /// serializes concurrent attempts; only the caller that wins performs
    /// promotion, roster sync, and notification.
    async fn finalize(
        &self,
        application_id: Uuid,
        outcome: ResolutionOutcome,
        cause: ResolutionCause,
    ) -> Result<ResolveDisposition, EngineError> {
        let resolved = with_backoff(&self.retry, "resolve", || {
            self.store.resolve(application_id, outcome)
        })
        .await?;

        let (application, previous) = match resolved {
            ResolveOutcome::AlreadyResolved(application) => {
                debug!(
                    application_id = %application_id,
                    status = application.status.as_str(),
                    "Resolution skipped, application already terminal"
                );
                return Ok(ResolveDisposition::AlreadyResolved(application));
            }
            ResolveOutcome::Resolved {
                application,
                previous,
            } => (application, previous),
        };

        info!(
            application_id = %application.id,
            candidate_id = application.candidate_id,
            previous = previous.as_str(),
            status = application.status.as_str(),
            cause = ?cause,
            positive = application.positive_votes,
            negative = application.negative_votes,
            "Application resolved"
        );

        let mut external_synced = true;
        match outcome {
            ResolutionOutcome::Approved => {
                with_backoff(&self.retry, "promote_member", || {
                    self.store
                        .set_eligibility(application.candidate_id, Role::Member, true)
                })
                .await?;
                if let Err(e) = self
                    .whitelist
                    .add(&application.nickname, &application.candidate_id.to_string())
                    .await
                {
                    warn!(
                        application_id = %application.id,
                        nickname = %application.nickname,
                        error = %e,
                        "Whitelist sync failed after approval, decision stands"
                    );
                    external_synced = false;
                }
                self.notifier
                    .notify(
                        application.candidate_id,
                        NotifyEvent::ApplicationApproved {
                            application_id: application.id,
                        },
                    )
                    .await;
            }
            ResolutionOutcome::Rejected => {
                self.notifier
                    .notify(
                        application.candidate_id,
                        NotifyEvent::ApplicationRejected {
                            application_id: application.id,
                        },
                    )
                    .await;
            }
            ResolutionOutcome::Expired => {
                self.notifier
                    .notify(
                        application.candidate_id,
                        NotifyEvent::ApplicationExpired {
                            application_id: application.id,
                        },
                    )
                    .await;
            }
        }

        Ok(ResolveDisposition::Resolved(ResolutionSummary {
            application,
            cause,
            external_synced,
        }))
    }
}

impl ResolveDisposition {
    fn into_summary(self) -> Option<ResolutionSummary> {
        match self {
            ResolveDisposition::Resolved(summary) => Some(summary),
            ResolveDisposition::AlreadyResolved(_) => None,
        }
    }
}
