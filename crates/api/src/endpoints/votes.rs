//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use updown_common::{AppError, AppResult};
use updown_core::{EntityRef, ValidationError, VoteFilter, VoteOutcome, VoteStatus};
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Cast vote request (direction comes from the route).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[validate(length(min = 1, max = 64))]
    pub votable_type: String,

    #[validate(length(min = 1, max = 64))]
    pub votable_id: String,

    #[validate(length(min = 1, max = 64))]
    pub voter_type: String,

    #[validate(length(min = 1, max = 64))]
    pub voter_id: String,

    #[validate(length(max = 8192))]
    pub comment: Option<String>,

    #[serde(default)]
    pub feedback_tags: Vec<String>,
}

/// Pair-keyed request (delete, status).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePairRequest {
    pub votable_type: String,
    pub votable_id: String,
    pub voter_type: String,
    pub voter_id: String,
}

/// List votes request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVotesRequest {
    pub votable_type: String,
    pub votable_id: String,
    /// "up" or "down"; absent = both directions.
    pub direction: Option<String>,
    pub has_comment: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    10
}

/// Parse an API direction label.
fn parse_direction(label: &str) -> AppResult<bool> {
    match label {
        "up" => Ok(true),
        "down" => Ok(false),
        other => Err(AppError::Validation(format!(
            "direction must be \"up\" or \"down\", got \"{other}\""
        ))),
    }
}

/// Vote response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub votable_type: String,
    pub votable_id: String,
    pub voter_type: String,
    pub voter_id: String,
    pub direction: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub feedback_tags: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<updown_db::entities::vote::Model> for VoteResponse {
    fn from(v: updown_db::entities::vote::Model) -> Self {
        Self {
            direction: v.direction_label(),
            feedback_tags: v.tag_list(),
            id: v.id,
            votable_type: v.votable_type,
            votable_id: v.votable_id,
            voter_type: v.voter_type,
            voter_id: v.voter_id,
            comment: v.comment,
            created_at: v.created_at.to_rfc3339(),
            updated_at: v.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Vote write response: the persisted vote, or the rejected candidate
/// with its structured validation errors, or a bare capability refusal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteWriteResponse {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

async fn cast(
    state: AppState,
    req: CastVoteRequest,
    direction: bool,
) -> AppResult<ApiResponse<VoteWriteResponse>> {
    req.validate()?;

    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let voter = EntityRef::new(req.voter_type, req.voter_id);

    let outcome = state
        .vote_service
        .vote_for(&votable, &voter, direction, req.comment, req.feedback_tags)
        .await?;

    Ok(match outcome {
        VoteOutcome::Saved(vote) => ApiResponse::ok(VoteWriteResponse {
            saved: true,
            vote: Some(vote.into()),
            errors: Vec::new(),
        }),
        VoteOutcome::Rejected { candidate, errors } => {
            let summary = errors.summary();
            ApiResponse::rejected(
                VoteWriteResponse {
                    saved: false,
                    vote: Some(candidate.into()),
                    errors: errors.into_iter().collect(),
                },
                "VALIDATION_ERROR",
                summary,
            )
        }
        // The false sentinel: this counterparty cannot vote. Not an error.
        VoteOutcome::Incapable => ApiResponse::ok(VoteWriteResponse {
            saved: false,
            vote: None,
            errors: Vec::new(),
        }),
    })
}

/// Cast or overwrite an up vote.
async fn up(
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteWriteResponse>> {
    cast(state, req, true).await
}

/// Cast or overwrite a down vote.
async fn down(
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteWriteResponse>> {
    cast(state, req, false).await
}

/// Remove vote response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveVoteResponse {
    pub deleted: bool,
}

/// Remove a vote.
async fn delete(
    State(state): State<AppState>,
    Json(req): Json<VotePairRequest>,
) -> AppResult<ApiResponse<RemoveVoteResponse>> {
    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let voter = EntityRef::new(req.voter_type, req.voter_id);

    let deleted = state.vote_service.remove_vote(&votable, &voter).await?;
    Ok(ApiResponse::ok(RemoveVoteResponse { deleted }))
}

/// One voter's standing on a votable plus aggregate counts.
async fn status(
    State(state): State<AppState>,
    Json(req): Json<VotePairRequest>,
) -> AppResult<ApiResponse<VoteStatus>> {
    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let voter = EntityRef::new(req.voter_type, req.voter_id);

    let status = state.vote_service.status(&votable, &voter).await?;
    Ok(ApiResponse::ok(status))
}

/// List votes on a votable.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListVotesRequest>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let votable = EntityRef::new(req.votable_type, req.votable_id);
    let filter = VoteFilter {
        direction: req.direction.as_deref().map(parse_direction).transpose()?,
        has_comment: req.has_comment,
    };
    let limit = req.limit.min(100);

    let votes = state
        .vote_service
        .list_votes(&votable, filter, limit, req.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/up", post(up))
        .route("/down", post(down))
        .route("/delete", post(delete))
        .route("/status", post(status))
        .route("/list", post(list))
}
