//! Expiration Sweeper
//!
//! Periodic task forcing resolution of applications whose voting window has
//! elapsed. Per-item failures are contained inside the sweep report; the
//! next tick re-attempts anything left unresolved.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::voting::engine::VotingEngine;

pub struct ExpirationSweeper {
    engine: Arc<VotingEngine>,
    period: Duration,
}

impl ExpirationSweeper {
    pub fn new(engine: Arc<VotingEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Run forever. Intended for `tokio::spawn`.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "Expiration sweeper started");

        loop {
            ticker.tick().await;
            match self.engine.sweep_due(Utc::now()).await {
                Ok(report) if report.scanned > 0 => {
                    info!(
                        scanned = report.scanned,
                        approved = report.approved,
                        rejected = report.rejected,
                        expired = report.expired,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Sweep pass complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    // Listing due applications failed outright; the next
                    // tick retries.
                    error!(error = %e, "Sweep pass failed");
                }
            }
        }
    }
}
