//! Reputation API Endpoints
//!
//! Ratings, score lookup, rating history, and administrative amnesty.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{error_response, ErrorBody};
use crate::reputation::{RatingPolarity, ReputationEngine, ReputationRecord};

#[derive(Clone)]
pub struct ReputationApiState {
    pub engine: Arc<ReputationEngine>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub actor_id: i64,
    pub polarity: RatingPolarity,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AmnestyRequest {
    pub actor_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub user_id: i64,
    pub positive: i64,
    pub negative: i64,
    pub net: i64,
    pub ejection_due: bool,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub record_id: uuid::Uuid,
    pub positive: i64,
    pub negative: i64,
    pub ejected: bool,
    pub external_synced: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: i64,
    pub total: usize,
    pub records: Vec<ReputationRecord>,
}

pub fn create_router(state: ReputationApiState) -> Router {
    Router::new()
        .route("/users/:id", get(get_reputation))
        .route("/users/:id/history", get(get_history))
        .route("/users/:id/ratings", post(submit_rating))
        .route("/users/:id/amnesty", post(grant_amnesty))
        .with_state(state)
}

async fn get_reputation(
    State(state): State<ReputationApiState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ReputationResponse>, (StatusCode, Json<ErrorBody>)> {
    let score = state.engine.score(user_id).await.map_err(error_response)?;
    let ejection_due = state
        .engine
        .check_ejection(user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ReputationResponse {
        user_id,
        positive: score.positive,
        negative: score.negative,
        net: score.net(),
        ejection_due,
    }))
}

async fn get_history(
    State(state): State<ReputationApiState>,
    Path(user_id): Path<i64>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorBody>)> {
    let records = state.engine.history(user_id).await.map_err(error_response)?;
    Ok(Json(HistoryResponse {
        user_id,
        total: records.len(),
        records,
    }))
}

async fn submit_rating(
    State(state): State<ReputationApiState>,
    Path(user_id): Path<i64>,
    Json(request): Json<RateRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), (StatusCode, Json<ErrorBody>)> {
    let actor = state
        .engine
        .actor(request.actor_id)
        .await
        .map_err(error_response)?;
    let receipt = state
        .engine
        .rate(&actor, user_id, request.polarity, request.reason.as_deref())
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            record_id: receipt.record.id,
            positive: receipt.score.positive,
            negative: receipt.score.negative,
            ejected: receipt.ejected,
            external_synced: receipt.external_synced,
        }),
    ))
}

async fn grant_amnesty(
    State(state): State<ReputationApiState>,
    Path(user_id): Path<i64>,
    Json(request): Json<AmnestyRequest>,
) -> Result<Json<ReputationResponse>, (StatusCode, Json<ErrorBody>)> {
    let actor = state
        .engine
        .actor(request.actor_id)
        .await
        .map_err(error_response)?;
    let score = state
        .engine
        .amnesty(&actor, user_id, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ReputationResponse {
        user_id,
        positive: score.positive,
        negative: score.negative,
        net: score.net(),
        ejection_due: false,
    }))
}
