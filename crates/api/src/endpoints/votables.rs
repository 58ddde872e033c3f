//! Votable-side aggregate endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use updown_common::{AppError, AppResult};
use updown_core::{EntityRef, VotableScope, VoteCounts};

use crate::{middleware::AppState, response::ApiResponse};

/// Votable counts request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsRequest {
    pub votable_type: String,
    pub votable_id: String,
}

/// Aggregate counts for a votable.
async fn counts(
    State(state): State<AppState>,
    Json(req): Json<CountsRequest>,
) -> AppResult<ApiResponse<VoteCounts>> {
    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let counts = state.vote_service.counts(&votable).await?;
    Ok(ApiResponse::ok(counts))
}

/// Scoped listing request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedRequest {
    /// Votable kind to list over.
    pub kind: String,
    /// One of "withVotes", "withUpVotes", "withDownVotes", "withComments".
    pub scope: String,
}

fn parse_scope(label: &str) -> AppResult<VotableScope> {
    match label {
        "withVotes" => Ok(VotableScope::WithVotes),
        "withUpVotes" => Ok(VotableScope::WithUpVotes),
        "withDownVotes" => Ok(VotableScope::WithDownVotes),
        "withComments" => Ok(VotableScope::WithComments),
        other => Err(AppError::Validation(format!(
            "unknown scope \"{other}\""
        ))),
    }
}

/// Distinct votables of one kind matching a scope, each exactly once.
async fn scoped(
    State(state): State<AppState>,
    Json(req): Json<ScopedRequest>,
) -> AppResult<ApiResponse<Vec<EntityRef>>> {
    let scope = parse_scope(&req.scope)?;
    let refs = state.vote_service.scoped_votables(&req.kind, scope).await?;
    Ok(ApiResponse::ok(refs))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/counts", post(counts))
        .route("/scoped", post(scoped))
}
