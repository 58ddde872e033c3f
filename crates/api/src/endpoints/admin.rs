//! Admin endpoints.
//!
//! Runtime catalog mutation and cascade purges for destroyed host
//! entities. All routes require admin authentication.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use updown_common::AppResult;
use updown_core::EntityRef;

use crate::extractors::AdminToken;
use crate::{middleware::AppState, response::ApiResponse};

/// Current feedback options.
async fn feedback_options(
    AdminToken(_): AdminToken,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<String>>> {
    Ok(ApiResponse::ok(state.catalog.current_tags()))
}

/// Replace feedback options request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedbackOptionsRequest {
    pub options: Vec<String>,
}

/// Replace the allowed feedback-tag set.
///
/// Takes effect for the next validation immediately. Stored rows keep
/// whatever tags they already carry.
async fn update_feedback_options(
    AdminToken(principal): AdminToken,
    State(state): State<AppState>,
    Json(req): Json<UpdateFeedbackOptionsRequest>,
) -> AppResult<ApiResponse<Vec<String>>> {
    tracing::info!(by = %principal, options = ?req.options, "Replacing feedback options");
    state.catalog.set_tags(req.options);
    Ok(ApiResponse::ok(state.catalog.current_tags()))
}

/// Purge request for a destroyed votable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeVotableRequest {
    pub votable_type: String,
    pub votable_id: String,
}

/// Purge request for a destroyed voter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeVoterRequest {
    pub voter_type: String,
    pub voter_id: String,
}

/// Purge response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub removed: u64,
}

/// Cascade-delete all votes on a destroyed votable.
async fn purge_votable(
    AdminToken(_): AdminToken,
    State(state): State<AppState>,
    Json(req): Json<PurgeVotableRequest>,
) -> AppResult<ApiResponse<PurgeResponse>> {
    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let removed = state.vote_service.purge_votable(&votable).await?;
    Ok(ApiResponse::ok(PurgeResponse { removed }))
}

/// Cascade-delete all votes cast by a destroyed voter.
async fn purge_voter(
    AdminToken(_): AdminToken,
    State(state): State<AppState>,
    Json(req): Json<PurgeVoterRequest>,
) -> AppResult<ApiResponse<PurgeResponse>> {
    let voter = EntityRef::new(req.voter_type, req.voter_id);
    let removed = state.vote_service.purge_voter(&voter).await?;
    Ok(ApiResponse::ok(PurgeResponse { removed }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback-options", post(feedback_options))
        .route("/feedback-options/update", post(update_feedback_options))
        .route("/votables/purge", post(purge_votable))
        .route("/voters/purge", post(purge_voter))
}
