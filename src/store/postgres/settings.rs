//! Settings Repository - singleton system settings row

use sqlx::{PgPool, Row};

use crate::error::EngineError;
use crate::store::postgres::classify;
use crate::store::SystemSettings;

pub struct SettingsRepository {
    pool: PgPool,
}

const UPSERT: &str = r#"
    INSERT INTO system_settings
        (id, voting_window_minutes, min_votes_required, min_participation_percent,
         approval_threshold_percent, rejection_threshold_percent,
         negative_ratings_threshold_percent, rating_cooldown_minutes, updated_at)
    VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7, $8)
"#;

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<SystemSettings, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT voting_window_minutes, min_votes_required, min_participation_percent,
                   approval_threshold_percent, rejection_threshold_percent,
                   negative_ratings_threshold_percent, rating_cooldown_minutes, updated_at
            FROM system_settings
            WHERE id = TRUE
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("get_settings", e))?;

        match row {
            Some(row) => {
                let min_votes: i32 = row.get("min_votes_required");
                let participation: i32 = row.get("min_participation_percent");
                let approval: i32 = row.get("approval_threshold_percent");
                let rejection: i32 = row.get("rejection_threshold_percent");
                let negative: i32 = row.get("negative_ratings_threshold_percent");
                Ok(SystemSettings {
                    voting_window_minutes: row.get("voting_window_minutes"),
                    min_votes_required: min_votes as u32,
                    min_participation_percent: participation as u32,
                    approval_threshold_percent: approval as u32,
                    rejection_threshold_percent: rejection as u32,
                    negative_ratings_threshold_percent: negative as u32,
                    rating_cooldown_minutes: row.get("rating_cooldown_minutes"),
                    updated_at: row.get("updated_at"),
                })
            }
            None => Ok(SystemSettings::default()),
        }
    }

    pub async fn update(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        let sql = format!(
            "{} ON CONFLICT (id) DO UPDATE SET
                voting_window_minutes = EXCLUDED.voting_window_minutes,
                min_votes_required = EXCLUDED.min_votes_required,
                min_participation_percent = EXCLUDED.min_participation_percent,
                approval_threshold_percent = EXCLUDED.approval_threshold_percent,
                rejection_threshold_percent = EXCLUDED.rejection_threshold_percent,
                negative_ratings_threshold_percent = EXCLUDED.negative_ratings_threshold_percent,
                rating_cooldown_minutes = EXCLUDED.rating_cooldown_minutes,
                updated_at = EXCLUDED.updated_at",
            UPSERT
        );
        self.write(&sql, settings).await
    }

    pub async fn seed(&self, settings: &SystemSettings) -> Result<(), EngineError> {
        let sql = format!("{} ON CONFLICT (id) DO NOTHING", UPSERT);
        self.write(&sql, settings).await
    }

    async fn write(&self, sql: &str, settings: &SystemSettings) -> Result<(), EngineError> {
        sqlx::query(sql)
            .bind(settings.voting_window_minutes)
            .bind(settings.min_votes_required as i32)
            .bind(settings.min_participation_percent as i32)
            .bind(settings.approval_threshold_percent as i32)
            .bind(settings.rejection_threshold_percent as i32)
            .bind(settings.negative_ratings_threshold_percent as i32)
            .bind(settings.rating_cooldown_minutes)
            .bind(settings.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| classify("update_settings", e))?;
        Ok(())
    }
}
