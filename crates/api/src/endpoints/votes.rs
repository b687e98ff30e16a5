//! Vote endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use storyhub_common::AppResult;
use storyhub_core::CastOutcome;
use storyhub_db::entities::{Votable, VotableKind, VoteDirection, vote};

use super::{default_limit, max_limit};
use crate::{extractors::ActingUser, middleware::AppState, response::ApiResponse};

/// Vote response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub id: String,
    pub voter_id: String,
    pub votable_type: VotableKind,
    pub votable_id: String,
    pub direction: VoteDirection,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<vote::Model> for VoteResponse {
    fn from(vote: vote::Model) -> Self {
        Self {
            id: vote.id,
            voter_id: vote.voter_id,
            votable_type: vote.votable_type,
            votable_id: vote.votable_id,
            direction: vote.direction,
            created_at: vote.created_at.to_rfc3339(),
            updated_at: vote.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Identifies the story or comment a request targets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub votable_type: VotableKind,
    pub votable_id: String,
}

impl TargetRequest {
    fn votable(&self) -> Votable {
        Votable::new(self.votable_type, self.votable_id.as_str())
    }
}

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRequest {
    #[serde(flatten)]
    pub target: TargetRequest,
    pub direction: VoteDirection,
}

/// Cast, flip or toggle off the acting user's vote.
async fn cast(
    ActingUser(user): ActingUser,
    State(state): State<AppState>,
    Json(req): Json<CastRequest>,
) -> AppResult<ApiResponse<CastOutcome>> {
    let outcome = state
        .vote_service
        .cast(&user.id, &req.target.votable(), req.direction)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

async fn retract(
    ActingUser(user): ActingUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<CastOutcome>> {
    let outcome = state
        .vote_service
        .retract(&user.id, &req.votable())
        .await?;
    Ok(ApiResponse::ok(outcome))
}

/// The acting user's vote on the target, `null` if none.
async fn mine(
    ActingUser(user): ActingUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<Option<VoteResponse>>> {
    let vote = state
        .vote_service
        .get_vote(&user.id, &req.votable())
        .await?;
    Ok(ApiResponse::ok(vote.map(Into::into)))
}

/// List votes request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVotesRequest {
    #[serde(flatten)]
    pub target: TargetRequest,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListVotesRequest>,
) -> AppResult<ApiResponse<Vec<VoteResponse>>> {
    let limit = req.limit.min(max_limit());
    let votes = state
        .vote_service
        .list_votes(&req.target.votable(), limit, req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(votes.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/retract", post(retract))
        .route("/mine", post(mine))
        .route("/list", post(list))
}
