//! Settings API Endpoints
//!
//! Read and tune the singleton settings row (governance action, admin only).
//! The update is a full-row PUT: the handler validates and writes the
//! submitted policy in one store call, so two concurrent admin updates
//! serialize at the store instead of interleaving a read-modify-write.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{error_response, ErrorBody};
use crate::error::EngineError;
use crate::identity;
use crate::store::{Store, SystemSettings};

#[derive(Clone)]
pub struct SettingsApiState {
    pub store: Arc<dyn Store>,
}

/// Full replacement policy. Every knob is required; a client that wants to
/// change one value reads the current row first and sends it back whole.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub actor_id: i64,
    pub voting_window_minutes: i64,
    pub min_votes_required: u32,
    pub min_participation_percent: u32,
    pub approval_threshold_percent: u32,
    pub rejection_threshold_percent: u32,
    pub negative_ratings_threshold_percent: u32,
    pub rating_cooldown_minutes: i64,
}

impl UpdateSettingsRequest {
    fn validate(&self) -> Result<(), EngineError> {
        if self.voting_window_minutes <= 0 {
            return Err(EngineError::InvalidState(
                "voting window must be positive".to_string(),
            ));
        }
        if self.min_votes_required == 0 {
            return Err(EngineError::InvalidState(
                "at least one vote must be required to resolve an application".to_string(),
            ));
        }
        for value in [
            self.min_participation_percent,
            self.approval_threshold_percent,
            self.rejection_threshold_percent,
            self.negative_ratings_threshold_percent,
        ] {
            if value > 100 {
                return Err(EngineError::InvalidState(format!(
                    "percentage cannot exceed 100 (got {})",
                    value
                )));
            }
        }
        Ok(())
    }

    fn to_settings(&self) -> SystemSettings {
        SystemSettings {
            voting_window_minutes: self.voting_window_minutes,
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

pub fn create_router(state: SettingsApiState) -> Router {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .with_state(state)
}

async fn get_settings(
    State(state): State<SettingsApiState>,
) -> Result<Json<SystemSettings>, (StatusCode, Json<ErrorBody>)> {
    let settings = state.store.get_settings().await.map_err(error_response)?;
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<SettingsApiState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SystemSettings>, (StatusCode, Json<ErrorBody>)> {
    let actor = identity::resolve_actor(state.store.as_ref(), request.actor_id)
        .await
        .map_err(error_response)?;
    if !actor.can_manage {
        return Err(error_response(EngineError::NotEligible(
            "changing settings requires an administrator",
        )));
    }

    request.validate().map_err(error_response)?;
    let settings = request.to_settings();
    state
        .store
        .update_settings(&settings)
        .await
        .map_err(error_response)?;
    Ok(Json(settings))
}
