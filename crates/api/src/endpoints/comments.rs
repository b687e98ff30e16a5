//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use storyhub_common::AppResult;
use storyhub_core::CreateCommentInput;
use storyhub_db::entities::{VotableStats, comment};

use super::{default_limit, max_limit};
use crate::{extractors::ActingUser, middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub story_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub body: String,
    pub depth: i32,
    #[serde(flatten)]
    pub stats: VotableStats,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            stats: comment.stats(),
            id: comment.id,
            story_id: comment.story_id,
            parent_id: comment.parent_id,
            author_id: comment.author_id,
            body: comment.body,
            depth: comment.depth,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Comment on a story, or reply to a comment, as the acting user.
async fn create(
    ActingUser(user): ActingUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Show comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowCommentRequest {
    pub comment_id: String,
}

async fn show(
    State(state): State<AppState>,
    Json(req): Json<ShowCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.get(&req.comment_id).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Thread request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRequest {
    pub story_id: String,
}

/// Every comment on a story, shallowest first and best scoring first within a level.
async fn thread(
    State(state): State<AppState>,
    Json(req): Json<ThreadRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_for_story(&req.story_id).await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

/// Replies request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesRequest {
    pub comment_id: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

async fn replies(
    State(state): State<AppState>,
    Json(req): Json<RepliesRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let limit = req.limit.min(max_limit());
    let comments = state
        .comment_service
        .replies(&req.comment_id, limit, req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/thread", post(thread))
        .route("/replies", post(replies))
}
