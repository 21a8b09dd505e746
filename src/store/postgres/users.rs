//! User Repository - PostgreSQL operations for the identity store

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::EngineError;
use crate::identity::{Role, User};
use crate::store::postgres::classify;

pub struct UserRepository {
    pool: PgPool,
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, EngineError> {
    let role_str: String = row.get("role");
    let role = Role::parse(&role_str)
        .ok_or_else(|| EngineError::Store(format!("unknown role in users row: {}", role_str)))?;
    Ok(User {
        id: row.get("id"),
        handle: row.get("handle"),
        role,
        can_vote: row.get("can_vote"),
        active: row.get("active"),
        amnesty_at: row.get("amnesty_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT id, handle, role, can_vote, active, amnesty_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("get_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn upsert(&self, user: &User) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, handle, role, can_vote, active, amnesty_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                handle = EXCLUDED.handle,
                role = EXCLUDED.role,
                can_vote = EXCLUDED.can_vote,
                active = EXCLUDED.active,
                amnesty_at = EXCLUDED.amnesty_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.handle)
        .bind(user.role.as_str())
        .bind(user.can_vote)
        .bind(user.active)
        .bind(user.amnesty_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify("upsert_user", e))?;

        Ok(())
    }

    /// Role + voting flag in one locked write. Returns whether the row
    /// changed, so callers can gate exactly-once side effects on it.
    pub async fn set_eligibility(
        &self,
        id: i64,
        role: Role,
        can_vote: bool,
    ) -> Result<bool, EngineError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify("set_eligibility", e))?;

        let row = sqlx::query("SELECT role, can_vote FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| classify("set_eligibility", e))?
            .ok_or(EngineError::NotFound("user"))?;

        let current_role: String = row.get("role");
        let current_can_vote: bool = row.get("can_vote");
        if current_role == role.as_str() && current_can_vote == can_vote {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET role = $2, can_vote = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .bind(can_vote)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| classify("set_eligibility", e))?;

        tx.commit()
            .await
            .map_err(|e| classify("set_eligibility", e))?;
        Ok(true)
    }

    pub async fn count_eligible_voters(&self) -> Result<u32, EngineError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS eligible
            FROM users
            WHERE active AND can_vote AND role IN ('member', 'admin')
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("count_eligible_voters", e))?;

        let count: i64 = row.get("eligible");
        Ok(count as u32)
    }

    pub async fn list_eligible_voters(&self) -> Result<Vec<User>, EngineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, handle, role, can_vote, active, amnesty_at, created_at, updated_at
            FROM users
            WHERE active AND can_vote AND role IN ('member', 'admin')
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("list_eligible_voters", e))?;

        rows.iter().map(user_from_row).collect()
    }
}
