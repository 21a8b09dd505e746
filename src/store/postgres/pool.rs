//! PostgreSQL Connection Pool and Schema Initialization

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::EngineError;
use crate::store::postgres::classify;

pub async fn connect(connection_string: &str, max_connections: u32) -> Result<PgPool, EngineError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(connection_string)
        .await
        .map_err(|e| classify("connect", e))?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Create tables, constraints, and indexes. Idempotent; the unique
/// constraints here are the source of truth for the duplicate-application
/// and duplicate-vote invariants.
pub async fn init_schema(pool: &PgPool) -> Result<(), EngineError> {
    info!("Initializing database schema...");

    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGINT PRIMARY KEY,
            handle VARCHAR(255) NOT NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'applicant',
            can_vote BOOLEAN NOT NULL DEFAULT FALSE,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            amnesty_at TIMESTAMP WITH TIME ZONE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id UUID PRIMARY KEY,
            candidate_id BIGINT NOT NULL REFERENCES users(id),
            nickname VARCHAR(255) NOT NULL,
            reason TEXT NOT NULL,
            status VARCHAR(20) NOT NULL,
            deadline TIMESTAMP WITH TIME ZONE,
            positive_votes INTEGER NOT NULL DEFAULT 0,
            negative_votes INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        // At most one pending/voting application per candidate.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_applications_one_active
            ON applications(candidate_id) WHERE status IN ('pending', 'voting')
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_applications_due
            ON applications(status, deadline)
        "#,
        // One vote per (application, voter); immutable once cast.
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            application_id UUID NOT NULL REFERENCES applications(id),
            voter_id BIGINT NOT NULL REFERENCES users(id),
            polarity VARCHAR(10) NOT NULL,
            cast_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (application_id, voter_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS reputation_records (
            id UUID PRIMARY KEY,
            rater_id BIGINT NOT NULL REFERENCES users(id),
            target_id BIGINT NOT NULL REFERENCES users(id),
            polarity VARCHAR(10) NOT NULL,
            reason TEXT,
            weight INTEGER NOT NULL CHECK (weight > 0),
            rated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_reputation_pair
            ON reputation_records(rater_id, target_id, rated_at)
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_reputation_target
            ON reputation_records(target_id, rated_at)
        "#,
        // Singleton row: id is constrained to TRUE.
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            id BOOLEAN PRIMARY KEY DEFAULT TRUE CHECK (id),
            voting_window_minutes BIGINT NOT NULL,
            min_votes_required INTEGER NOT NULL,
            min_participation_percent INTEGER NOT NULL,
            approval_threshold_percent INTEGER NOT NULL,
            rejection_threshold_percent INTEGER NOT NULL,
            negative_ratings_threshold_percent INTEGER NOT NULL,
            rating_cooldown_minutes BIGINT NOT NULL,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| classify("init_schema", e))?;
    }

    info!("Database schema initialized");
    Ok(())
}
