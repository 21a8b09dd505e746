//! Engine Error Taxonomy
//!
//! Every engine operation returns a typed `EngineError` so callers can map
//! user mistakes, invariant violations, and infrastructure failures to
//! distinct user-facing messages. Only `Transient` is retryable; everything
//! else propagates immediately.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Entity missing from the store.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation is illegal for the entity's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Candidate already has a pending or voting application.
    #[error("candidate already has an active application")]
    DuplicateApplication,

    /// A vote from this voter already exists for this application.
    #[error("voter has already voted on this application")]
    AlreadyVoted,

    /// Actor lacks the role or eligibility the operation requires.
    #[error("not eligible: {0}")]
    NotEligible(&'static str),

    /// Actor targeting themselves (self-vote, self-rating).
    #[error("cannot {0} yourself")]
    SelfAction(&'static str),

    /// Per-rater-per-target rating cooldown still active.
    #[error("rating cooldown active for another {}s", .retry_after.num_seconds())]
    Cooldown { retry_after: chrono::Duration },

    /// Connection loss, lock wait timeout, serialization failure. Retryable.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// Non-transient store failure (constraint we don't map, decode error).
    #[error("store failure: {0}")]
    Store(String),

    /// Whitelist Sync or Notifier failure. Never invalidates a committed
    /// core decision; surfaced as degraded success.
    #[error("external service failure: {0}")]
    External(String),
}

impl EngineError {
    /// Predicate the retry policy uses to separate retryable infrastructure
    /// failures from terminal errors.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(EngineError::Transient("connection reset".into()).is_transient());
        assert!(!EngineError::NotFound("user").is_transient());
        assert!(!EngineError::AlreadyVoted.is_transient());
        assert!(!EngineError::Store("decode".into()).is_transient());
        assert!(!EngineError::External("whitelist down".into()).is_transient());
    }

    #[test]
    fn test_cooldown_message_includes_seconds() {
        let err = EngineError::Cooldown {
            retry_after: chrono::Duration::seconds(90),
        };
        assert!(err.to_string().contains("90s"));
    }
}
