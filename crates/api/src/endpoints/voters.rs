//! Voter-side query endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use updown_common::AppResult;
use updown_core::EntityRef;

use crate::endpoints::votes::VoteResponse;
use crate::{middleware::AppState, response::ApiResponse};

/// Voter-keyed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRequest {
    pub voter_type: String,
    pub voter_id: String,
    /// Restrict to votables of this kind.
    pub votable_kind: Option<String>,
}

/// List votes cast request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCastRequest {
    pub voter_type: String,
    pub voter_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Distinct votables this voter has voted on.
async fn voted(
    State(state): State<AppState>,
    Json(req): Json<VoterRequest>,
) -> AppResult<ApiResponse<Vec<EntityRef>>> {
    let voter = EntityRef::new(req.voter_type, req.voter_id);
    let refs = state
        .vote_service
        .votables_voted(&voter, req.votable_kind.as_deref())
        .await?;
    Ok(ApiResponse::ok(refs))
}

/// Votes-cast count response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesCastResponse {
    pub count: u64,
}

/// Count votes cast by a voter.
async fn count(
    State(state): State<AppState>,
    Json(req): Json<VoterRequest>,
) -> AppResult<ApiResponse<VotesCastResponse>> {
    let voter = EntityRef::new(req.voter_type, req.voter_id);
    let count = state.vote_service.votes_cast_count(&voter).await?;
    Ok(ApiResponse::ok(VotesCastResponse { count }))
}

/// List votes cast by a voter.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListCastRequest>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let voter = EntityRef::new(req.voter_type, req.voter_id);
    let limit = req.limit.min(100);

    let votes = state
        .vote_service
        .votes_by_voter(&voter, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/voted", post(voted))
        .route("/count", post(count))
        .route("/list", post(list))
}
