//! Vote Repository - PostgreSQL operations for the vote ledger
//!
//! A vote is one atomic unit: application row lock, vote insert, counter
//! increment, commit. The primary key on (application_id, voter_id) is the
//! source of truth for duplicate suppression: a double-tapped request hits
//! `ON CONFLICT DO NOTHING` and reports `AlreadyVoted` even when no lock
//! contention occurred.

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;
use crate::store::postgres::classify;
use crate::store::CastOutcome;
use crate::voting::application::{ApplicationStatus, Tally, VotePolarity};

pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn cast(
        &self,
        application_id: Uuid,
        voter_id: i64,
        polarity: VotePolarity,
    ) -> Result<CastOutcome, EngineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("cast_vote", e))?;

        let row = sqlx::query("SELECT status FROM applications WHERE id = $1 FOR UPDATE")
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify("cast_vote", e))?
            .ok_or(EngineError::NotFound("application"))?;

        let status_str: String = row.get("status");
        if status_str != ApplicationStatus::Voting.as_str() {
            return Err(EngineError::InvalidState(format!(
                "application is {}, not open for voting",
                status_str
            )));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO votes (application_id, voter_id, polarity, cast_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (application_id, voter_id) DO NOTHING
            "#,
        )
        .bind(application_id)
        .bind(voter_id)
        .bind(polarity.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| classify("cast_vote", e))?;

        if inserted.rows_affected() == 0 {
            // Nothing changed; the open transaction is dropped.
            return Ok(CastOutcome::AlreadyVoted);
        }

        let column = match polarity {
            VotePolarity::Positive => "positive_votes",
            VotePolarity::Negative => "negative_votes",
        };
        let row = sqlx::query(&format!(
            "UPDATE applications SET {col} = {col} + 1, updated_at = $2 \
             WHERE id = $1 RETURNING positive_votes, negative_votes",
            col = column
        ))
        .bind(application_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify("cast_vote", e))?;

        let positive: i32 = row.get("positive_votes");
        let negative: i32 = row.get("negative_votes");

        tx.commit().await.map_err(|e| classify("cast_vote", e))?;
        Ok(CastOutcome::Recorded(Tally {
            positive: positive as u32,
            negative: negative as u32,
        }))
    }

    /// Served from the denormalized counters; those are committed in the
    /// same transaction as each vote, so this reflects the latest commit.
    pub async fn tally(&self, application_id: Uuid) -> Result<Tally, EngineError> {
        let row = sqlx::query(
            "SELECT positive_votes, negative_votes FROM applications WHERE id = $1",
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("tally", e))?
        .ok_or(EngineError::NotFound("application"))?;

        let positive: i32 = row.get("positive_votes");
        let negative: i32 = row.get("negative_votes");
        Ok(Tally {
            positive: positive as u32,
            negative: negative as u32,
        })
    }
}
