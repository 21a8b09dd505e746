//! Whitelist Sync Client
//!
//! External collaborator that mutates the authoritative access roster. The
//! engine calls it after a decision has already committed; a failure here is
//! logged and surfaced as degraded success, never rolled back into the core
//! decision. Reconciliation of failed syncs belongs to the roster service's
//! own retry queue.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::EngineError;

#[async_trait]
pub trait WhitelistSync: Send + Sync {
    /// Add a roster entry. Returns whether the remote roster acknowledged
    /// the mutation.
    async fn add(&self, nickname: &str, identity_key: &str) -> Result<bool, EngineError>;

    /// Remove a roster entry.
    async fn remove(&self, nickname: &str, identity_key: &str) -> Result<bool, EngineError>;
}

#[derive(Serialize)]
struct RosterMutation<'a> {
    nickname: &'a str,
    identity_key: &'a str,
}

/// HTTP client against the roster service.
pub struct HttpWhitelistSync {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpWhitelistSync {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EngineError::External(format!("whitelist client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn post(&self, action: &str, nickname: &str, identity_key: &str) -> Result<bool, EngineError> {
        let url = format!("{}/whitelist/{}", self.base_url.trim_end_matches('/'), action);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&RosterMutation {
                nickname,
                identity_key,
            })
            .send()
            .await
            .map_err(|e| EngineError::External(format!("whitelist {}: {}", action, e)))?;

        if !response.status().is_success() {
            return Err(EngineError::External(format!(
                "whitelist {} returned {}",
                action,
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EngineError::External(format!("whitelist {}: {}", action, e)))?;
        let acknowledged = body.get("ok").and_then(Value::as_bool).unwrap_or(true);
        debug!(nickname = %nickname, action = action, acknowledged, "Whitelist sync call completed");
        Ok(acknowledged)
    }
}

#[async_trait]
impl WhitelistSync for HttpWhitelistSync {
    async fn add(&self, nickname: &str, identity_key: &str) -> Result<bool, EngineError> {
        self.post("add", nickname, identity_key).await
    }

    async fn remove(&self, nickname: &str, identity_key: &str) -> Result<bool, EngineError> {
        self.post("remove", nickname, identity_key).await
    }
}

/// Log-only implementation for deployments without a roster service.
pub struct DisabledWhitelistSync;

#[async_trait]
impl WhitelistSync for DisabledWhitelistSync {
    async fn add(&self, nickname: &str, _identity_key: &str) -> Result<bool, EngineError> {
        info!(nickname = %nickname, "Whitelist sync disabled, skipping roster add");
        Ok(true)
    }

    async fn remove(&self, nickname: &str, _identity_key: &str) -> Result<bool, EngineError> {
        info!(nickname = %nickname, "Whitelist sync disabled, skipping roster remove");
        Ok(true)
    }
}
