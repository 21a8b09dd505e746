//! Rating Repository - PostgreSQL operations for reputation records
//!
//! Rating inserts lock the target's user row first, serializing all ratings
//! against one target so the cooldown check and the insert are a single
//! atomic unit. Records are append-only; amnesty moves the negative
//! baseline on the user row instead of deleting history.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;
use crate::reputation::score::{RatingPolarity, ReputationRecord, ReputationScore};
use crate::store::postgres::classify;
use crate::store::RatingOutcome;

pub struct RatingRepository {
    pool: PgPool,
}

fn record_from_row(row: &PgRow) -> Result<ReputationRecord, EngineError> {
    let polarity_str: String = row.get("polarity");
    let polarity = RatingPolarity::parse(&polarity_str).ok_or_else(|| {
        EngineError::Store(format!(
            "unknown polarity in reputation_records row: {}",
            polarity_str
        ))
    })?;
    let weight: i32 = row.get("weight");
    Ok(ReputationRecord {
        id: row.get("id"),
        rater_id: row.get("rater_id"),
        target_id: row.get("target_id"),
        polarity,
        reason: row.get("reason"),
        weight: weight as u32,
        rated_at: row.get("rated_at"),
    })
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        rater_id: i64,
        target_id: i64,
        polarity: RatingPolarity,
        reason: Option<&str>,
        weight: u32,
        cooldown: chrono::Duration,
    ) -> Result<RatingOutcome, EngineError> {
        if weight == 0 {
            return Err(EngineError::InvalidState(
                "rating weight must be positive".to_string(),
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("insert_rating", e))?;

        // Serialize ratings against this target.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify("insert_rating", e))?
            .ok_or(EngineError::NotFound("user"))?;

        let now = Utc::now();
        let last = sqlx::query(
            r#"
            SELECT rated_at FROM reputation_records
            WHERE rater_id = $1 AND target_id = $2
            ORDER BY rated_at DESC
            LIMIT 1
            "#,
        )
        .bind(rater_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| classify("insert_rating", e))?;

        if let Some(row) = last {
            let rated_at: DateTime<Utc> = row.get("rated_at");
            let elapsed = now - rated_at;
            if elapsed < cooldown {
                return Ok(RatingOutcome::Cooldown {
                    retry_after: cooldown - elapsed,
                });
            }
        }

        let record = ReputationRecord {
            id: Uuid::new_v4(),
            rater_id,
            target_id,
            polarity,
            reason: reason.map(|r| r.to_string()),
            weight,
            rated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO reputation_records (id, rater_id, target_id, polarity, reason, weight, rated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.rater_id)
        .bind(record.target_id)
        .bind(record.polarity.as_str())
        .bind(&record.reason)
        .bind(record.weight as i32)
        .bind(record.rated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify("insert_rating", e))?;

        tx.commit().await.map_err(|e| classify("insert_rating", e))?;
        Ok(RatingOutcome::Recorded(record))
    }

    /// Weighted aggregates. Negative records at or before the amnesty
    /// baseline are excluded from the aggregate but remain in the table.
    pub async fn score(&self, user_id: i64) -> Result<ReputationScore, EngineError> {
        let row = sqlx::query("SELECT amnesty_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("score", e))?
            .ok_or(EngineError::NotFound("user"))?;
        let baseline: Option<DateTime<Utc>> = row.get("amnesty_at");

        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(weight) FILTER (WHERE polarity = 'positive'), 0) AS positive,
                COALESCE(SUM(weight) FILTER (
                    WHERE polarity = 'negative' AND ($2::timestamptz IS NULL OR rated_at > $2)
                ), 0) AS negative
            FROM reputation_records
            WHERE target_id = $1
            "#,
        )
        .bind(user_id)
        .bind(baseline)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("score", e))?;

        let positive: i64 = row.get("positive");
        let negative: i64 = row.get("negative");
        Ok(ReputationScore {
            user_id,
            positive,
            negative,
        })
    }

    pub async fn ratings_for(&self, target_id: i64) -> Result<Vec<ReputationRecord>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, rater_id, target_id, polarity, reason, weight, rated_at
            FROM reputation_records
            WHERE target_id = $1
            ORDER BY rated_at
            "#,
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("ratings_for", e))?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn grant_amnesty(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let updated = sqlx::query("UPDATE users SET amnesty_at = $2, updated_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| classify("grant_amnesty", e))?;

        if updated.rows_affected() == 0 {
            return Err(EngineError::NotFound("user"));
        }
        Ok(())
    }
}
