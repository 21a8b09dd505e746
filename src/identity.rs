//! Identity Store Types and Capability Resolution
//!
//! User records carry a role, a voting-eligibility flag, and the amnesty
//! baseline for the reputation engine. Capability checks are collapsed into
//! a single resolution point: handlers resolve an [`Actor`] once per request
//! and pass it into engine operations instead of re-deriving permissions at
//! each call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "applicant" => Some(Role::Applicant),
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable external identity (e.g. chat platform user id).
    pub id: i64,
    pub handle: String,
    pub role: Role,
    /// Voting eligibility. Invariant: implies role is Member or Admin.
    pub can_vote: bool,
    /// Users are deactivated, never deleted.
    pub active: bool,
    /// Baseline for the negative reputation aggregate; ratings at or before
    /// this instant no longer count against the user.
    pub amnesty_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New users enter as non-voting applicants.
    pub fn new(id: i64, handle: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            handle,
            role: Role::Applicant,
            can_vote: false,
            active: true,
            amnesty_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Resolved per-request capabilities, computed once from the user record.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
    /// May cast votes and submit ratings.
    pub can_vote: bool,
    /// May start voting, resolve applications directly, grant amnesty,
    /// and change settings.
    pub can_manage: bool,
}

impl Actor {
    pub fn resolve(user: &User) -> Actor {
        let voting_role = matches!(user.role, Role::Member | Role::Admin);
        Actor {
            user_id: user.id,
            role: user.role,
            can_vote: user.active && user.can_vote && voting_role,
            can_manage: user.active && user.role == Role::Admin,
        }
    }
}

/// Fetch a user and resolve their capabilities in one step.
pub async fn resolve_actor(store: &dyn Store, user_id: i64) -> Result<Actor, EngineError> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or(EngineError::NotFound("user"))?;
    Ok(Actor::resolve(&user))
}
