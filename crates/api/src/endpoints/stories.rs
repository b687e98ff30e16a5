//! Story endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use storyhub_common::{AppError, AppResult};
use storyhub_core::CreateStoryInput;
use storyhub_db::entities::{VotableStats, story};

use super::{default_limit, max_limit};
use crate::{extractors::ActingUser, middleware::AppState, response::ApiResponse};

/// Story response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    #[serde(flatten)]
    pub stats: VotableStats,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<story::Model> for StoryResponse {
    fn from(story: story::Model) -> Self {
        Self {
            stats: story.stats(),
            id: story.id,
            author_id: story.author_id,
            title: story.title,
            slug: story.slug,
            body: story.body,
            created_at: story.created_at.to_rfc3339(),
            updated_at: story.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Create a story as the acting user.
async fn create(
    ActingUser(user): ActingUser,
    State(state): State<AppState>,
    Json(input): Json<CreateStoryInput>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state.story_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(story.into()))
}

/// Show story request. Exactly one of `storyId` or `slug` is expected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowStoryRequest {
    pub story_id: Option<String>,
    pub slug: Option<String>,
}

async fn show(
    State(state): State<AppState>,
    Json(req): Json<ShowStoryRequest>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = match (req.story_id, req.slug) {
        (Some(id), _) => state.story_service.get(&id).await?,
        (None, Some(slug)) => state.story_service.get_by_slug(&slug).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "storyId or slug is required".to_string(),
            ));
        }
    };
    Ok(ApiResponse::ok(story.into()))
}

/// List stories request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoriesRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

/// Newest stories first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListStoriesRequest>,
) -> AppResult<ApiResponse<Vec<StoryResponse>>> {
    let limit = req.limit.min(max_limit());
    let stories = state
        .story_service
        .list(limit, req.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(stories.into_iter().map(Into::into).collect()))
}

/// Top stories request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStoriesRequest {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// Highest scoring stories first.
async fn top(
    State(state): State<AppState>,
    Json(req): Json<TopStoriesRequest>,
) -> AppResult<ApiResponse<Vec<StoryResponse>>> {
    let limit = req.limit.min(max_limit());
    let stories = state.story_service.top(limit).await?;
    Ok(ApiResponse::ok(stories.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/top", post(top))
}
