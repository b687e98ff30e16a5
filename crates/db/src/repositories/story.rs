//! Story repository.

use std::sync::Arc;

use crate::entities::{Story, VotableStats, story};
use storyhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, sea_query::Expr,
};

/// Story repository for database operations.
#[derive(Clone)]
pub struct StoryRepository {
    db: Arc<DatabaseConnection>,
}

impl StoryRepository {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a story by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<story::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(id.to_string()))
    }

    /// Find a story by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<story::Model>> {
        Story::find()
            .filter(story::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new story.
    ///
    /// A slug taken by a concurrent insert is [`AppError::Conflict`].
    pub async fn create(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Story slug already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Get newest stories (paginated).
    pub async fn find_recent(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<story::Model>> {
        let mut query = Story::find().order_by_desc(story::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(story::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the highest scored stories.
    pub async fn find_top(&self, limit: u64) -> AppResult<Vec<story::Model>> {
        Story::find()
            .order_by_desc(story::Column::VoteScore)
            .order_by_desc(story::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch a story with `SELECT ... FOR UPDATE`, holding its row lock
    /// until `conn`'s transaction ends.
    pub async fn lock_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the four vote stat columns in one UPDATE.
    ///
    /// Returns the number of rows written (0 when the story does not exist).
    pub async fn apply_stats_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        stats: &VotableStats,
    ) -> AppResult<u64> {
        let result = Story::update_many()
            .col_expr(story::Column::UpvoteCount, Expr::value(stats.upvote_count))
            .col_expr(story::Column::DownvoteCount, Expr::value(stats.downvote_count))
            .col_expr(story::Column::VoteCount, Expr::value(stats.vote_count))
            .col_expr(story::Column::VoteScore, Expr::value(stats.vote_score))
            .filter(story::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || e.to_string().contains("duplicate key value violates unique constraint")
}
