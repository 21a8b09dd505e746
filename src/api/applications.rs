//! Application API Endpoints
//!
//! Submit, open voting, vote, resolve, and inspect applications.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error_response;
use crate::api::ErrorBody;
use crate::voting::{
    Application, ResolutionOutcome, ResolveDisposition, ResolutionSummary, TallyDecision,
    VotePolarity, VotingEngine,
};

#[derive(Clone)]
pub struct ApplicationApiState {
    pub engine: Arc<VotingEngine>,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub candidate_id: i64,
    pub nickname: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct StartVotingRequest {
    pub actor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub actor_id: i64,
    pub polarity: VotePolarity,
}

#[derive(Debug, Deserialize)]
pub struct AdminResolveRequest {
    pub actor_id: i64,
    pub outcome: ResolutionOutcome,
}

// Response types

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application: Application,
}

#[derive(Debug, Serialize)]
pub struct ActiveApplicationResponse {
    pub candidate_id: i64,
    /// The candidate's pending or voting application, if one exists.
    pub application: Option<Application>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub application_id: Uuid,
    pub positive: u32,
    pub negative: u32,
    pub decision: TallyDecision,
    pub resolution: Option<ResolutionSummary>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub already_resolved: bool,
    pub application: Application,
    pub external_synced: bool,
}

pub fn create_router(state: ApplicationApiState) -> Router {
    Router::new()
        .route("/", post(submit_application))
        .route("/:id", get(get_application))
        .route("/candidate/:candidate_id", get(get_active_application))
        .route("/:id/start", post(start_voting))
        .route("/:id/votes", post(cast_vote))
        .route("/:id/resolve", post(admin_resolve))
        .with_state(state)
}

async fn submit_application(
    State(state): State<ApplicationApiState>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), (StatusCode, Json<ErrorBody>)> {
    let application = state
        .engine
        .submit_application(request.candidate_id, &request.nickname, &request.reason)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse { application })))
}

async fn get_application(
    State(state): State<ApplicationApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>, (StatusCode, Json<ErrorBody>)> {
    let application = state
        .engine
        .application_status(id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApplicationResponse { application }))
}

async fn get_active_application(
    State(state): State<ApplicationApiState>,
    Path(candidate_id): Path<i64>,
) -> Result<Json<ActiveApplicationResponse>, (StatusCode, Json<ErrorBody>)> {
    let application = state
        .engine
        .active_application(candidate_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ActiveApplicationResponse {
        candidate_id,
        application,
    }))
}

async fn start_voting(
    State(state): State<ApplicationApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StartVotingRequest>,
) -> Result<Json<ApplicationResponse>, (StatusCode, Json<ErrorBody>)> {
    let actor = state
        .engine
        .actor(request.actor_id)
        .await
        .map_err(error_response)?;
    let application = state
        .engine
        .start_voting(&actor, id, Utc::now())
        .await
        .map_err(error_response)?;
    Ok(Json(ApplicationResponse { application }))
}

async fn cast_vote(
    State(state): State<ApplicationApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CastVoteRequest>,
) -> Result<Json<VoteResponse>, (StatusCode, Json<ErrorBody>)> {
    let actor = state
        .engine
        .actor(request.actor_id)
        .await
        .map_err(error_response)?;
    let receipt = state
        .engine
        .cast_vote(&actor, id, request.polarity)
        .await
        .map_err(error_response)?;
    Ok(Json(VoteResponse {
        application_id: receipt.application_id,
        positive: receipt.tally.positive,
        negative: receipt.tally.negative,
        decision: receipt.decision,
        resolution: receipt.resolution,
    }))
}

async fn admin_resolve(
    State(state): State<ApplicationApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminResolveRequest>,
) -> Result<Json<ResolveResponse>, (StatusCode, Json<ErrorBody>)> {
    let actor = state
        .engine
        .actor(request.actor_id)
        .await
        .map_err(error_response)?;
    let disposition = state
        .engine
        .admin_resolve(&actor, id, request.outcome)
        .await
        .map_err(error_response)?;

    let response = match disposition {
        ResolveDisposition::Resolved(summary) => ResolveResponse {
            already_resolved: false,
            application: summary.application,
            external_synced: summary.external_synced,
        },
        ResolveDisposition::AlreadyResolved(application) => ResolveResponse {
            already_resolved: true,
            application,
            external_synced: true,
        },
    };
    Ok(Json(response))
}
