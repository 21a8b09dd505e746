//! Configuration
//!
//! Environment-driven (`GATEWARDEN_*`), defaults first, validation at load.
//! Voting and reputation knobs here only seed the settings row on first
//! start; after that the admin settings endpoint owns them.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::env;

use crate::store::SystemSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub sweeper: SweeperConfig,
    pub whitelist: WhitelistConfig,
    pub voting: VotingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub postgres_enabled: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between expiration sweep passes
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistConfig {
    /// Enable the HTTP roster client; disabled deployments log roster
    /// mutations instead
    pub enabled: bool,
    pub base_url: String,
    /// API key - MUST come from the environment when enabled
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Initial voting and reputation thresholds, used to seed the settings row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    pub window_minutes: i64,
    pub min_votes_required: u32,
    pub min_participation_percent: u32,
    pub approval_threshold_percent: u32,
    pub rejection_threshold_percent: u32,
    pub negative_ratings_threshold_percent: u32,
    pub rating_cooldown_minutes: i64,
}

impl VotingConfig {
    pub fn to_settings(&self) -> SystemSettings {
        SystemSettings {
            voting_window_minutes: self.window_minutes,
            min_votes_required: self.min_votes_required,
            min_participation_percent: self.min_participation_percent,
            approval_threshold_percent: self.approval_threshold_percent,
            rejection_threshold_percent: self.rejection_threshold_percent,
            negative_ratings_threshold_percent: self.negative_ratings_threshold_percent,
            rating_cooldown_minutes: self.rating_cooldown_minutes,
            updated_at: Utc::now(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                postgres_url: "postgresql://localhost:5432/gatewarden".to_string(),
                postgres_enabled: false,
                max_connections: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            sweeper: SweeperConfig { interval_secs: 60 },
            whitelist: WhitelistConfig {
                enabled: false,
                base_url: "http://127.0.0.1:8090".to_string(),
                api_key: String::new(),
                timeout_secs: 10,
            },
            voting: VotingConfig {
                window_minutes: 3 * 24 * 60,
                min_votes_required: 3,
                min_participation_percent: 40,
                approval_threshold_percent: 60,
                rejection_threshold_percent: 60,
                negative_ratings_threshold_percent: 30,
                rating_cooldown_minutes: 24 * 60,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("GATEWARDEN_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("GATEWARDEN_PORT") {
            config.server.port = port.parse().context("Invalid GATEWARDEN_PORT value")?;
        }

        if let Ok(url) = env::var("GATEWARDEN_POSTGRES_URL") {
            config.database.postgres_url = url;
            config.database.postgres_enabled = true;
        }
        if let Ok(enabled) = env::var("GATEWARDEN_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid GATEWARDEN_POSTGRES_ENABLED value")?;
        }
        if let Ok(max) = env::var("GATEWARDEN_POSTGRES_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid GATEWARDEN_POSTGRES_MAX_CONNECTIONS value")?;
        }

        if let Ok(level) = env::var("GATEWARDEN_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(interval) = env::var("GATEWARDEN_SWEEP_INTERVAL_SECS") {
            config.sweeper.interval_secs = interval
                .parse()
                .context("Invalid GATEWARDEN_SWEEP_INTERVAL_SECS value")?;
        }

        if let Ok(base_url) = env::var("GATEWARDEN_WHITELIST_URL") {
            config.whitelist.base_url = base_url;
            config.whitelist.enabled = true;
        }
        if let Ok(api_key) = env::var("GATEWARDEN_WHITELIST_API_KEY") {
            config.whitelist.api_key = api_key;
        }
        if let Ok(timeout) = env::var("GATEWARDEN_WHITELIST_TIMEOUT_SECS") {
            config.whitelist.timeout_secs = timeout
                .parse()
                .context("Invalid GATEWARDEN_WHITELIST_TIMEOUT_SECS value")?;
        }

        if let Ok(minutes) = env::var("GATEWARDEN_VOTING_WINDOW_MINUTES") {
            config.voting.window_minutes = minutes
                .parse()
                .context("Invalid GATEWARDEN_VOTING_WINDOW_MINUTES value")?;
        }
        if let Ok(min_votes) = env::var("GATEWARDEN_MIN_VOTES") {
            config.voting.min_votes_required =
                min_votes.parse().context("Invalid GATEWARDEN_MIN_VOTES value")?;
        }
        if let Ok(participation) = env::var("GATEWARDEN_MIN_PARTICIPATION_PERCENT") {
            config.voting.min_participation_percent = participation
                .parse()
                .context("Invalid GATEWARDEN_MIN_PARTICIPATION_PERCENT value")?;
        }
        if let Ok(approval) = env::var("GATEWARDEN_APPROVAL_PERCENT") {
            config.voting.approval_threshold_percent = approval
                .parse()
                .context("Invalid GATEWARDEN_APPROVAL_PERCENT value")?;
        }
        if let Ok(rejection) = env::var("GATEWARDEN_REJECTION_PERCENT") {
            config.voting.rejection_threshold_percent = rejection
                .parse()
                .context("Invalid GATEWARDEN_REJECTION_PERCENT value")?;
        }
        if let Ok(negative) = env::var("GATEWARDEN_NEGATIVE_THRESHOLD_PERCENT") {
            config.voting.negative_ratings_threshold_percent = negative
                .parse()
                .context("Invalid GATEWARDEN_NEGATIVE_THRESHOLD_PERCENT value")?;
        }
        if let Ok(cooldown) = env::var("GATEWARDEN_RATING_COOLDOWN_MINUTES") {
            config.voting.rating_cooldown_minutes = cooldown
                .parse()
                .context("Invalid GATEWARDEN_RATING_COOLDOWN_MINUTES value")?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.voting.window_minutes <= 0 {
            anyhow::bail!("voting window must be positive");
        }
        if self.voting.min_votes_required == 0 {
            anyhow::bail!("at least one vote must be required to resolve an application");
        }
        for (name, value) in [
            ("min participation", self.voting.min_participation_percent),
            ("approval threshold", self.voting.approval_threshold_percent),
            ("rejection threshold", self.voting.rejection_threshold_percent),
            (
                "negative ratings threshold",
                self.voting.negative_ratings_threshold_percent,
            ),
        ] {
            if value > 100 {
                anyhow::bail!("{} percentage cannot exceed 100 (got {})", name, value);
            }
        }
        if self.whitelist.enabled && self.whitelist.api_key.is_empty() {
            anyhow::bail!(
                "whitelist sync is enabled but GATEWARDEN_WHITELIST_API_KEY is not set"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_min_votes_rejected() {
        let mut config = AppConfig::default();
        config.voting.min_votes_required = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        let mut config = AppConfig::default();
        config.voting.approval_threshold_percent = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_whitelist_requires_key() {
        let mut config = AppConfig::default();
        config.whitelist.enabled = true;
        config.whitelist.api_key = String::new();
        assert!(config.validate().is_err());
        config.whitelist.api_key = "secret".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_seed_settings_mirror_config() {
        let config = AppConfig::default();
        let settings = config.voting.to_settings();
        assert_eq!(settings.min_votes_required, config.voting.min_votes_required);
        assert_eq!(
            settings.voting_window_minutes,
            config.voting.window_minutes
        );
    }
}
