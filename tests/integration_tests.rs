//! Integration tests for the membership engines
//!
//! These tests drive the voting and reputation engines end-to-end against
//! the in-memory store, covering lifecycle transitions, threshold
//! resolution, concurrency invariants, ejection, and amnesty.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::join_all;
use tokio::sync::Mutex;

use gatewarden::{
    voting::ResolveDisposition, ApplicationStatus, EngineError, MemoryStore, Notifier,
    NotifyEvent, RatingPolarity, ReputationEngine, ResolutionOutcome, RetryPolicy, Role, Store,
    SystemSettings, TallyDecision, User, VotePolarity, VotingEngine, WhitelistSync,
};

// ============================================================================
// Test Doubles
// ============================================================================

/// Counts roster mutations; can be flipped to fail additions to exercise
/// the degraded-success path.
#[derive(Default)]
struct RecordingWhitelist {
    added: AtomicUsize,
    removed: AtomicUsize,
    fail_add: AtomicBool,
}

#[async_trait]
impl WhitelistSync for RecordingWhitelist {
    async fn add(&self, _nickname: &str, _identity_key: &str) -> Result<bool, EngineError> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(EngineError::External("roster unavailable".to_string()));
        }
        self.added.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn remove(&self, _nickname: &str, _identity_key: &str) -> Result<bool, EngineError> {
        self.removed.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(i64, NotifyEvent)>>,
}

impl RecordingNotifier {
    async fn count(&self, user_id: i64, matcher: impl Fn(&NotifyEvent) -> bool) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|(id, event)| *id == user_id && matcher(event))
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: i64, event: NotifyEvent) {
        self.events.lock().await.push((user_id, event));
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

const ADMIN_ID: i64 = 1;
const CANDIDATE_ID: i64 = 100;

struct Harness {
    store: Arc<MemoryStore>,
    whitelist: Arc<RecordingWhitelist>,
    notifier: Arc<RecordingNotifier>,
    voting: Arc<VotingEngine>,
    reputation: Arc<ReputationEngine>,
}

fn member_user(id: i64, role: Role) -> User {
    let mut user = User::new(id, format!("member-{}", id));
    user.role = role;
    user.can_vote = true;
    user
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

/// Community of 10 eligible voters: one admin plus nine members. With the
/// default policy (min 3 votes, 40% participation, 60% approval) the
/// participation floor is 4 votes.
async fn community() -> Harness {
    let store = Arc::new(MemoryStore::new());
    store
        .seed_settings(&SystemSettings::default())
        .await
        .expect("seed settings");

    store
        .upsert_user(&member_user(ADMIN_ID, Role::Admin))
        .await
        .expect("seed admin");
    for id in 2..=10 {
        store
            .upsert_user(&member_user(id, Role::Member))
            .await
            .expect("seed member");
    }

    let whitelist = Arc::new(RecordingWhitelist::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let voting = Arc::new(
        VotingEngine::new(store.clone(), whitelist.clone(), notifier.clone())
            .with_retry_policy(fast_retry()),
    );
    let reputation = Arc::new(
        ReputationEngine::new(store.clone(), whitelist.clone(), notifier.clone())
            .with_retry_policy(fast_retry()),
    );

    Harness {
        store,
        whitelist,
        notifier,
        voting,
        reputation,
    }
}

/// Submit for the default candidate and open the voting window.
async fn open_application(h: &Harness) -> gatewarden::Application {
    let application = h
        .voting
        .submit_application(CANDIDATE_ID, "newcomer", "wants in")
        .await
        .expect("submit");
    let admin = h.voting.actor(ADMIN_ID).await.expect("admin actor");
    h.voting
        .start_voting(&admin, application.id, Utc::now())
        .await
        .expect("start voting")
}

// ============================================================================
// Application Lifecycle
// ============================================================================

#[tokio::test]
async fn second_application_rejected_while_first_active() {
    let h = community().await;

    h.voting
        .submit_application(CANDIDATE_ID, "newcomer", "wants in")
        .await
        .expect("first submit");
    let err = h
        .voting
        .submit_application(CANDIDATE_ID, "newcomer", "asking again")
        .await
        .expect_err("second submit must fail");
    assert!(matches!(err, EngineError::DuplicateApplication));
}

#[tokio::test]
async fn concurrent_submissions_admit_exactly_one() {
    let h = community().await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let voting = h.voting.clone();
            tokio::spawn(
                async move { voting.submit_application(CANDIDATE_ID, "newcomer", "race").await },
            )
        })
        .collect();

    let successes = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn terminal_application_frees_the_slot() {
    let h = community().await;
    let application = open_application(&h).await;

    let active = h
        .voting
        .active_application(CANDIDATE_ID)
        .await
        .unwrap()
        .expect("open application is active");
    assert_eq!(active.id, application.id);

    let admin = h.voting.actor(ADMIN_ID).await.unwrap();
    h.voting
        .admin_resolve(&admin, application.id, ResolutionOutcome::Rejected)
        .await
        .expect("resolve");
    assert!(h
        .voting
        .active_application(CANDIDATE_ID)
        .await
        .unwrap()
        .is_none());

    // A rejected candidate may apply again.
    h.voting
        .submit_application(CANDIDATE_ID, "newcomer", "second try")
        .await
        .expect("reapply after rejection");
}

#[tokio::test]
async fn vote_before_window_opens_is_rejected() {
    let h = community().await;
    let application = h
        .voting
        .submit_application(CANDIDATE_ID, "newcomer", "wants in")
        .await
        .unwrap();

    let voter = h.voting.actor(2).await.unwrap();
    let err = h
        .voting
        .cast_vote(&voter, application.id, VotePolarity::Positive)
        .await
        .expect_err("pending application must not accept votes");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

// ============================================================================
// Vote Resolution
// ============================================================================

#[tokio::test]
async fn decisive_vote_approves_and_promotes() {
    let h = community().await;
    let application = open_application(&h).await;

    // Three in favor, one against: the fourth vote meets the participation
    // floor and clears 60% approval.
    for (voter_id, polarity) in [
        (2, VotePolarity::Positive),
        (3, VotePolarity::Positive),
        (4, VotePolarity::Negative),
    ] {
        let actor = h.voting.actor(voter_id).await.unwrap();
        let receipt = h
            .voting
            .cast_vote(&actor, application.id, polarity)
            .await
            .expect("vote");
        assert_eq!(receipt.decision, TallyDecision::Undecided);
        assert!(receipt.resolution.is_none());
    }

    let actor = h.voting.actor(5).await.unwrap();
    let receipt = h
        .voting
        .cast_vote(&actor, application.id, VotePolarity::Positive)
        .await
        .expect("decisive vote");
    assert_eq!(receipt.decision, TallyDecision::Approve);
    let resolution = receipt.resolution.expect("decisive vote resolves");
    assert_eq!(resolution.application.status, ApplicationStatus::Approved);
    assert!(resolution.external_synced);

    // Side effects ran exactly once.
    assert_eq!(h.whitelist.added.load(Ordering::SeqCst), 1);
    let candidate = h
        .store
        .get_user(CANDIDATE_ID)
        .await
        .unwrap()
        .expect("candidate exists");
    assert_eq!(candidate.role, Role::Member);
    assert!(candidate.can_vote);
    let approvals = h
        .notifier
        .count(CANDIDATE_ID, |e| {
            matches!(e, NotifyEvent::ApplicationApproved { .. })
        })
        .await;
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn negative_majority_rejects() {
    let h = community().await;
    let application = open_application(&h).await;

    // One in favor, three against: 75% negative clears the rejection bar.
    for (voter_id, polarity) in [
        (2, VotePolarity::Positive),
        (3, VotePolarity::Negative),
        (4, VotePolarity::Negative),
    ] {
        let actor = h.voting.actor(voter_id).await.unwrap();
        h.voting
            .cast_vote(&actor, application.id, polarity)
            .await
            .expect("vote");
    }
    let actor = h.voting.actor(5).await.unwrap();
    let receipt = h
        .voting
        .cast_vote(&actor, application.id, VotePolarity::Negative)
        .await
        .expect("decisive vote");

    assert_eq!(receipt.decision, TallyDecision::Reject);
    let resolution = receipt.resolution.expect("decisive vote resolves");
    assert_eq!(resolution.application.status, ApplicationStatus::Rejected);
    assert_eq!(h.whitelist.added.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn same_voter_cannot_vote_twice() {
    let h = community().await;
    let application = open_application(&h).await;

    let actor = h.voting.actor(2).await.unwrap();
    h.voting
        .cast_vote(&actor, application.id, VotePolarity::Positive)
        .await
        .expect("first vote");
    let err = h
        .voting
        .cast_vote(&actor, application.id, VotePolarity::Negative)
        .await
        .expect_err("second vote must fail");
    assert!(matches!(err, EngineError::AlreadyVoted));

    let tally = h.voting.tally(application.id).await.unwrap();
    assert_eq!((tally.positive, tally.negative), (1, 0));
}

#[tokio::test]
async fn concurrent_double_tap_records_one_vote() {
    let h = community().await;
    let application = open_application(&h).await;
    let actor = h.voting.actor(2).await.unwrap();

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let voting = h.voting.clone();
            tokio::spawn(async move {
                voting
                    .cast_vote(&actor, application.id, VotePolarity::Positive)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result.as_ref().unwrap_err(),
            EngineError::AlreadyVoted
        ));
    }

    let tally = h.voting.tally(application.id).await.unwrap();
    assert_eq!(tally.total(), 1);
}

#[tokio::test]
async fn concurrent_distinct_voters_lose_no_votes() {
    let h = community().await;
    let application = open_application(&h).await;

    let mut tasks = Vec::new();
    for voter_id in [2, 3, 4] {
        let voting = h.voting.clone();
        let actor = h.voting.actor(voter_id).await.unwrap();
        tasks.push(tokio::spawn(async move {
            voting
                .cast_vote(&actor, application.id, VotePolarity::Positive)
                .await
        }));
    }
    for joined in join_all(tasks).await {
        joined.expect("task panicked").expect("vote");
    }

    // Three of ten eligible is below the participation floor: all three
    // counter increments must survive without a resolution.
    let tally = h.voting.tally(application.id).await.unwrap();
    assert_eq!((tally.positive, tally.negative), (3, 0));
    let current = h.voting.application_status(application.id).await.unwrap();
    assert_eq!(current.status, ApplicationStatus::Voting);
}

#[tokio::test]
async fn candidate_cannot_vote_on_own_application() {
    let h = community().await;

    // A sitting member applies (e.g. for a renamed roster entry); their own
    // ballot is refused even though they are otherwise eligible.
    let application = h
        .voting
        .submit_application(2, "member-2", "rename")
        .await
        .unwrap();
    let admin = h.voting.actor(ADMIN_ID).await.unwrap();
    let application = h
        .voting
        .start_voting(&admin, application.id, Utc::now())
        .await
        .unwrap();

    let actor = h.voting.actor(2).await.unwrap();
    let err = h
        .voting
        .cast_vote(&actor, application.id, VotePolarity::Positive)
        .await
        .expect_err("self-vote must fail");
    assert!(matches!(err, EngineError::SelfAction(_)));
}

#[tokio::test]
async fn non_member_cannot_vote() {
    let h = community().await;
    let application = open_application(&h).await;

    // Another applicant has a user record but no ballot.
    h.store
        .upsert_user(&User::new(101, "other-applicant".to_string()))
        .await
        .unwrap();
    let actor = h.voting.actor(101).await.unwrap();
    let err = h
        .voting
        .cast_vote(&actor, application.id, VotePolarity::Positive)
        .await
        .expect_err("applicant vote must fail");
    assert!(matches!(err, EngineError::NotEligible(_)));
}

#[tokio::test]
async fn admin_resolution_is_idempotent() {
    let h = community().await;
    let application = open_application(&h).await;
    let admin = h.voting.actor(ADMIN_ID).await.unwrap();

    let first = h
        .voting
        .admin_resolve(&admin, application.id, ResolutionOutcome::Approved)
        .await
        .expect("first resolve");
    assert!(matches!(first, ResolveDisposition::Resolved(_)));

    let second = h
        .voting
        .admin_resolve(&admin, application.id, ResolutionOutcome::Approved)
        .await
        .expect("second resolve");
    match second {
        ResolveDisposition::AlreadyResolved(app) => {
            assert_eq!(app.status, ApplicationStatus::Approved)
        }
        ResolveDisposition::Resolved(_) => panic!("second resolve must be a no-op"),
    }

    // Second call performed no side effects.
    assert_eq!(h.whitelist.added.load(Ordering::SeqCst), 1);
    let approvals = h
        .notifier
        .count(CANDIDATE_ID, |e| {
            matches!(e, NotifyEvent::ApplicationApproved { .. })
        })
        .await;
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn admin_cannot_force_expiry() {
    let h = community().await;
    let application = open_application(&h).await;
    let admin = h.voting.actor(ADMIN_ID).await.unwrap();

    let err = h
        .voting
        .admin_resolve(&admin, application.id, ResolutionOutcome::Expired)
        .await
        .expect_err("manual expiry must fail");
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn member_cannot_open_or_resolve() {
    let h = community().await;
    let application = h
        .voting
        .submit_application(CANDIDATE_ID, "newcomer", "wants in")
        .await
        .unwrap();
    let member = h.voting.actor(2).await.unwrap();

    let err = h
        .voting
        .start_voting(&member, application.id, Utc::now())
        .await
        .expect_err("member must not open voting");
    assert!(matches!(err, EngineError::NotEligible(_)));

    let err = h
        .voting
        .admin_resolve(&member, application.id, ResolutionOutcome::Approved)
        .await
        .expect_err("member must not resolve");
    assert!(matches!(err, EngineError::NotEligible(_)));
}

// ============================================================================
// Expiration Sweeps
// ============================================================================

#[tokio::test]
async fn sweep_expires_undecided_application_once() {
    let h = community().await;
    let application = open_application(&h).await;

    // Below the participation floor at the deadline.
    let actor = h.voting.actor(2).await.unwrap();
    h.voting
        .cast_vote(&actor, application.id, VotePolarity::Positive)
        .await
        .unwrap();

    let after_deadline = Utc::now() + Duration::days(4);
    let report = h.voting.sweep_due(after_deadline).await.expect("sweep");
    assert_eq!(report.scanned, 1);
    assert_eq!(report.expired, 1);

    let current = h.voting.application_status(application.id).await.unwrap();
    assert_eq!(current.status, ApplicationStatus::Expired);

    // A later pass finds nothing due.
    let report = h.voting.sweep_due(after_deadline).await.expect("resweep");
    assert_eq!(report.scanned, 0);
    let expiries = h
        .notifier
        .count(CANDIDATE_ID, |e| {
            matches!(e, NotifyEvent::ApplicationExpired { .. })
        })
        .await;
    assert_eq!(expiries, 1);
}

#[tokio::test]
async fn sweep_approves_decided_tally_at_deadline() {
    let h = community().await;
    let application = open_application(&h).await;

    // Four in favor resolves immediately; expire-time approval needs a
    // tally that only becomes decisive because the electorate shrank. Two
    // members lose their ballots after voting.
    for voter_id in [2, 3, 4] {
        let actor = h.voting.actor(voter_id).await.unwrap();
        h.voting
            .cast_vote(&actor, application.id, VotePolarity::Positive)
            .await
            .unwrap();
    }
    for ejected_id in [9, 10] {
        h.store
            .set_eligibility(ejected_id, Role::Applicant, false)
            .await
            .unwrap();
    }

    // Eight eligible: the floor drops to max(ceil(8*40/100), 3) = 4... the
    // existing three still miss it, so shrink once more.
    h.store
        .set_eligibility(8, Role::Applicant, false)
        .await
        .unwrap();

    let report = h
        .voting
        .sweep_due(Utc::now() + Duration::days(4))
        .await
        .expect("sweep");
    assert_eq!(report.approved, 1);
    assert_eq!(h.whitelist.added.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_sweeps_resolve_once() {
    let h = community().await;
    open_application(&h).await;

    let after_deadline = Utc::now() + Duration::days(4);
    let first = h.voting.clone();
    let second = h.voting.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { first.sweep_due(after_deadline).await }),
        tokio::spawn(async move { second.sweep_due(after_deadline).await }),
    );
    let a = a.expect("task panicked").expect("sweep");
    let b = b.expect("task panicked").expect("sweep");

    assert_eq!(a.expired + b.expired, 1);
    assert_eq!(a.failed + b.failed, 0);
    let expiries = h
        .notifier
        .count(CANDIDATE_ID, |e| {
            matches!(e, NotifyEvent::ApplicationExpired { .. })
        })
        .await;
    assert_eq!(expiries, 1);
}

// ============================================================================
// Reputation & Ejection
// ============================================================================

#[tokio::test]
async fn negative_threshold_ejects_exactly_once() {
    let h = community().await;
    const TARGET: i64 = 2;

    // 30% of ten eligible voters rounds up to three negatives.
    for (n, rater_id) in [3, 4].into_iter().enumerate() {
        let actor = h.reputation.actor(rater_id).await.unwrap();
        let receipt = h
            .reputation
            .rate(&actor, TARGET, RatingPolarity::Negative, Some("afk"))
            .await
            .expect("rating");
        assert_eq!(receipt.score.negative, n as i64 + 1);
        assert!(!receipt.ejected);
    }

    let actor = h.reputation.actor(5).await.unwrap();
    let receipt = h
        .reputation
        .rate(&actor, TARGET, RatingPolarity::Negative, Some("afk"))
        .await
        .expect("third rating");
    assert!(receipt.ejected);
    assert!(receipt.external_synced);
    assert_eq!(h.whitelist.removed.load(Ordering::SeqCst), 1);

    let target = h.store.get_user(TARGET).await.unwrap().unwrap();
    assert_eq!(target.role, Role::Applicant);
    assert!(!target.can_vote);
    assert_eq!(
        h.notifier
            .count(TARGET, |e| matches!(e, NotifyEvent::Ejected))
            .await,
        1
    );

    // Already demoted: a further negative does not re-eject.
    let actor = h.reputation.actor(6).await.unwrap();
    let receipt = h
        .reputation
        .rate(&actor, TARGET, RatingPolarity::Negative, None)
        .await
        .expect("fourth rating");
    assert!(!receipt.ejected);
    assert_eq!(h.whitelist.removed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn positive_ratings_do_not_trigger_ejection() {
    let h = community().await;

    for rater_id in [3, 4, 5, 6] {
        let actor = h.reputation.actor(rater_id).await.unwrap();
        let receipt = h
            .reputation
            .rate(&actor, 2, RatingPolarity::Positive, Some("helpful"))
            .await
            .expect("rating");
        assert!(!receipt.ejected);
    }

    let score = h.reputation.score(2).await.unwrap();
    assert_eq!((score.positive, score.negative), (4, 0));
    assert_eq!(score.net(), 4);
    assert_eq!(h.whitelist.removed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeat_rating_within_cooldown_rejected() {
    let h = community().await;
    let actor = h.reputation.actor(3).await.unwrap();

    h.reputation
        .rate(&actor, 2, RatingPolarity::Positive, None)
        .await
        .expect("first rating");
    let err = h
        .reputation
        .rate(&actor, 2, RatingPolarity::Negative, None)
        .await
        .expect_err("second rating inside cooldown must fail");
    match err {
        EngineError::Cooldown { retry_after } => assert!(retry_after.num_seconds() > 0),
        other => panic!("expected cooldown, got {:?}", other),
    }

    // The cooldown is per rater/target pair; a different rater proceeds.
    let other = h.reputation.actor(4).await.unwrap();
    h.reputation
        .rate(&other, 2, RatingPolarity::Positive, None)
        .await
        .expect("different rater");
}

#[tokio::test]
async fn self_rating_rejected() {
    let h = community().await;
    let actor = h.reputation.actor(2).await.unwrap();

    let err = h
        .reputation
        .rate(&actor, 2, RatingPolarity::Positive, None)
        .await
        .expect_err("self-rating must fail");
    assert!(matches!(err, EngineError::SelfAction(_)));
}

#[tokio::test]
async fn amnesty_resets_aggregate_and_keeps_history() {
    let h = community().await;
    const TARGET: i64 = 2;

    for rater_id in [3, 4] {
        let actor = h.reputation.actor(rater_id).await.unwrap();
        h.reputation
            .rate(&actor, TARGET, RatingPolarity::Negative, Some("afk"))
            .await
            .expect("rating");
    }
    assert_eq!(h.reputation.score(TARGET).await.unwrap().negative, 2);

    let admin = h.reputation.actor(ADMIN_ID).await.unwrap();
    let score = h
        .reputation
        .amnesty(&admin, TARGET, Utc::now())
        .await
        .expect("amnesty");
    assert_eq!((score.positive, score.negative), (0, 0));

    // The ledger itself is untouched.
    assert_eq!(h.reputation.history(TARGET).await.unwrap().len(), 2);
    assert_eq!(
        h.notifier
            .count(TARGET, |e| matches!(e, NotifyEvent::AmnestyGranted))
            .await,
        1
    );

    // Ratings after the baseline count from scratch.
    let actor = h.reputation.actor(5).await.unwrap();
    let receipt = h
        .reputation
        .rate(&actor, TARGET, RatingPolarity::Negative, None)
        .await
        .expect("post-amnesty rating");
    assert_eq!(receipt.score.negative, 1);
    assert!(!receipt.ejected);
}

#[tokio::test]
async fn amnesty_requires_admin() {
    let h = community().await;
    let member = h.reputation.actor(3).await.unwrap();

    let err = h
        .reputation
        .amnesty(&member, 2, Utc::now())
        .await
        .expect_err("member amnesty must fail");
    assert!(matches!(err, EngineError::NotEligible(_)));
}

// ============================================================================
// Degraded Success
// ============================================================================

#[tokio::test]
async fn approval_stands_when_roster_sync_fails() {
    let h = community().await;
    let application = open_application(&h).await;
    h.whitelist.fail_add.store(true, Ordering::SeqCst);

    let admin = h.voting.actor(ADMIN_ID).await.unwrap();
    let disposition = h
        .voting
        .admin_resolve(&admin, application.id, ResolutionOutcome::Approved)
        .await
        .expect("resolve");
    let summary = match disposition {
        ResolveDisposition::Resolved(summary) => summary,
        ResolveDisposition::AlreadyResolved(_) => panic!("first resolve must win"),
    };

    assert_eq!(summary.application.status, ApplicationStatus::Approved);
    assert!(!summary.external_synced);

    // Promotion committed regardless of the roster failure.
    let candidate = h.store.get_user(CANDIDATE_ID).await.unwrap().unwrap();
    assert_eq!(candidate.role, Role::Member);
    assert!(candidate.can_vote);
}
