//! Application Repository - PostgreSQL operations for the application ledger
//!
//! Lifecycle mutations lock the application row (`SELECT ... FOR UPDATE`)
//! before reading its status, so two concurrent callers cannot both observe
//! pre-mutation state. The partial unique index on active candidates backs
//! the duplicate-application guard.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::EngineError;
use crate::store::postgres::{classify, is_unique_violation};
use crate::store::ResolveOutcome;
use crate::voting::application::{Application, ApplicationStatus, ResolutionOutcome};

pub struct ApplicationRepository {
    pool: PgPool,
}

pub(crate) fn application_from_row(row: &PgRow) -> Result<Application, EngineError> {
    let status_str: String = row.get("status");
    let status = ApplicationStatus::parse(&status_str).ok_or_else(|| {
        EngineError::Store(format!("unknown status in applications row: {}", status_str))
    })?;
    let positive: i32 = row.get("positive_votes");
    let negative: i32 = row.get("negative_votes");
    Ok(Application {
        id: row.get("id"),
        candidate_id: row.get("candidate_id"),
        nickname: row.get("nickname"),
        reason: row.get("reason"),
        status,
        deadline: row.get("deadline"),
        positive_votes: positive as u32,
        negative_votes: negative as u32,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const SELECT_COLUMNS: &str = "id, candidate_id, nickname, reason, status, deadline, \
     positive_votes, negative_votes, created_at, updated_at";

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        candidate_id: i64,
        nickname: &str,
        reason: &str,
    ) -> Result<Application, EngineError> {
        let application = Application::new(candidate_id, nickname.to_string(), reason.to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO applications
                (id, candidate_id, nickname, reason, status, positive_votes, negative_votes,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, 0, $6, $7)
            "#,
        )
        .bind(application.id)
        .bind(application.candidate_id)
        .bind(&application.nickname)
        .bind(&application.reason)
        .bind(application.status.as_str())
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(application),
            // Partial unique index on active candidates: the insert itself
            // is the race-free duplicate check.
            Err(e) if is_unique_violation(&e) => Err(EngineError::DuplicateApplication),
            Err(e) => Err(classify("create_application", e)),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Application>, EngineError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("get_application", e))?;

        row.as_ref().map(application_from_row).transpose()
    }

    pub async fn find_active_by_candidate(
        &self,
        candidate_id: i64,
    ) -> Result<Option<Application>, EngineError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM applications WHERE candidate_id = $1 AND status IN ('pending', 'voting')",
            SELECT_COLUMNS
        ))
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("find_active_by_candidate", e))?;

        row.as_ref().map(application_from_row).transpose()
    }

    pub async fn start_voting(
        &self,
        id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<Application, EngineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("start_voting", e))?;

        let row = sqlx::query("SELECT status FROM applications WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify("start_voting", e))?
            .ok_or(EngineError::NotFound("application"))?;

        let status_str: String = row.get("status");
        if status_str != ApplicationStatus::Pending.as_str() {
            return Err(EngineError::InvalidState(format!(
                "cannot start voting from {}",
                status_str
            )));
        }

        let row = sqlx::query(&format!(
            "UPDATE applications SET status = 'voting', deadline = $2, updated_at = $3 \
             WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(deadline)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify("start_voting", e))?;

        let application = application_from_row(&row)?;
        tx.commit().await.map_err(|e| classify("start_voting", e))?;
        Ok(application)
    }

    /// Idempotent terminal transition under the row lock: concurrent
    /// attempts serialize, exactly one observes a non-terminal status.
    pub async fn resolve(
        &self,
        id: Uuid,
        outcome: ResolutionOutcome,
    ) -> Result<ResolveOutcome, EngineError> {
        let mut tx = self.pool.begin().await.map_err(|e| classify("resolve", e))?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM applications WHERE id = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| classify("resolve", e))?
        .ok_or(EngineError::NotFound("application"))?;

        let current = application_from_row(&row)?;
        if current.status.is_terminal() {
            return Ok(ResolveOutcome::AlreadyResolved(current));
        }
        if !outcome.permitted_from(current.status) {
            return Err(EngineError::InvalidState(format!(
                "cannot resolve {} from {}",
                outcome.status().as_str(),
                current.status.as_str()
            )));
        }

        let row = sqlx::query(&format!(
            "UPDATE applications SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(outcome.status().as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify("resolve", e))?;

        let application = application_from_row(&row)?;
        tx.commit().await.map_err(|e| classify("resolve", e))?;
        Ok(ResolveOutcome::Resolved {
            application,
            previous: current.status,
        })
    }

    pub async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Application>, EngineError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM applications WHERE status = 'voting' AND deadline <= $1",
            SELECT_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("list_due", e))?;

        rows.iter().map(application_from_row).collect()
    }
}
