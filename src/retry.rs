//! Bounded Exponential Backoff for Transient Store Failures
//!
//! Every mutating engine operation goes through [`with_backoff`] with the
//! same policy: terminal errors (not-found, duplicate, invalid-state,
//! not-eligible) propagate immediately, transient errors (connection loss,
//! lock wait timeout, serialization failure) are retried a bounded number
//! of times before surfacing.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (1-based):
    /// min(base * 2^(attempt-1), max).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

/// Run `op`, retrying transient failures per `policy`. `operation` names the
/// call in logs.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay(attempt);
                warn!(
                    operation = operation,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient store failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
        assert_eq!(policy.delay(3), Duration::from_millis(4000));
        // Capped at 5000ms from the fourth attempt on.
        assert_eq!(policy.delay(4), Duration::from_millis(5000));
        assert_eq!(policy.delay(10), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(&fast_policy(), "test_op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(EngineError::Transient("connection reset".into()))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff(&fast_policy(), "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::Transient("lock timeout".into())) }
        })
        .await;
        assert!(matches!(result, Err(EngineError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_errors_never_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff(&fast_policy(), "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::AlreadyVoted) }
        })
        .await;
        assert!(matches!(result, Err(EngineError::AlreadyVoted)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
