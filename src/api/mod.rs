//! HTTP API
//!
//! Thin presentation seam over the engines. Handlers resolve the acting
//! user's capabilities once, call one engine operation, and map the typed
//! error onto a status code. Terminal errors keep distinct kinds so
//! operators can tell user mistakes from systemic failures in logs.

pub mod applications;
pub mod reputation;
pub mod settings;

pub use applications::{create_router as create_application_router, ApplicationApiState};
pub use reputation::{create_router as create_reputation_router, ReputationApiState};
pub use settings::{create_router as create_settings_router, SettingsApiState};

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::EngineError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

pub(crate) fn error_response(err: EngineError) -> (StatusCode, Json<ErrorBody>) {
    let (status, kind) = match &err {
        EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        EngineError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
        EngineError::DuplicateApplication => (StatusCode::CONFLICT, "duplicate_application"),
        EngineError::AlreadyVoted => (StatusCode::CONFLICT, "already_voted"),
        EngineError::NotEligible(_) => (StatusCode::FORBIDDEN, "not_eligible"),
        EngineError::SelfAction(_) => (StatusCode::FORBIDDEN, "self_action"),
        EngineError::Cooldown { .. } => (StatusCode::TOO_MANY_REQUESTS, "cooldown"),
        // Retries already exhausted by the engine: generic try-again-later.
        EngineError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "transient"),
        EngineError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
        EngineError::External(_) => (StatusCode::BAD_GATEWAY, "external"),
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            kind,
        }),
    )
}
