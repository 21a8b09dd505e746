//! Lifecycle Notifier
//!
//! Best-effort delivery of lifecycle events to users. Fire-and-forget from
//! the engine's perspective: implementations log delivery failures and never
//! block or reverse a committed core transition, so the trait is infallible.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// An application entered its voting window; sent to eligible voters.
    VotingOpened { application_id: Uuid, nickname: String },
    ApplicationApproved { application_id: Uuid },
    ApplicationRejected { application_id: Uuid },
    ApplicationExpired { application_id: Uuid },
    Ejected,
    AmnestyGranted,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: i64, event: NotifyEvent);
}

/// Default implementation: structured log lines in place of a delivery
/// channel.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: i64, event: NotifyEvent) {
        info!(user_id = user_id, event = ?event, "Notification");
    }
}
