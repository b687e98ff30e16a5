//! Comment service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use storyhub_common::{AppError, AppResult, IdGenerator};
use storyhub_db::{
    entities::comment,
    repositories::{CommentRepository, StoryRepository, UserRepository},
};
use validator::Validate;

/// Input for creating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub story_id: String,
    /// Comment being replied to; `None` for a top-level comment.
    pub parent_id: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    story_repo: StoryRepository,
    user_repo: UserRepository,
    max_depth: i32,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        story_repo: StoryRepository,
        user_repo: UserRepository,
        max_depth: i32,
    ) -> Self {
        Self {
            comment_repo,
            story_repo,
            user_repo,
            max_depth,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a comment authored by `author_id`.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        self.story_repo.get_by_id(&input.story_id).await?;
        self.user_repo.get_by_id(author_id).await?;

        let depth = match input.parent_id.as_deref() {
            None => 0,
            Some(parent_id) => {
                let parent = self.comment_repo.get_by_id(parent_id).await?;
                if parent.story_id != input.story_id {
                    return Err(AppError::BadRequest(
                        "Parent comment belongs to another story".to_string(),
                    ));
                }
                parent.depth + 1
            }
        };

        if depth > self.max_depth {
            return Err(AppError::BadRequest(format!(
                "Replies cannot be nested deeper than {}",
                self.max_depth
            )));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            story_id: Set(input.story_id),
            parent_id: Set(input.parent_id),
            author_id: Set(author_id.to_string()),
            body: Set(input.body),
            depth: Set(depth),
            upvote_count: Set(0),
            downvote_count: Set(0),
            vote_count: Set(0),
            vote_score: Set(0.0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = %created.id,
            story_id = %created.story_id,
            depth = created.depth,
            "Comment created"
        );
        Ok(created)
    }

    /// Get a comment by ID.
    pub async fn get(&self, id: &str) -> AppResult<comment::Model> {
        self.comment_repo.get_by_id(id).await
    }

    /// All comments on a story, ordered for threaded display.
    pub async fn list_for_story(&self, story_id: &str) -> AppResult<Vec<comment::Model>> {
        self.story_repo.get_by_id(story_id).await?;
        self.comment_repo.find_by_story(story_id).await
    }

    /// Direct replies to a comment.
    pub async fn replies(
        &self,
        parent_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        self.comment_repo
            .find_replies(parent_id, limit, until_id)
            .await
    }
}
