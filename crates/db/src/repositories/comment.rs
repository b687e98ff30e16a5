//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, VotableStats, comment};
use storyhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All comments on a story, shallowest first, best scored first within a level.
    pub async fn find_by_story(&self, story_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::StoryId.eq(story_id))
            .order_by_asc(comment::Column::Depth)
            .order_by_desc(comment::Column::VoteScore)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Direct replies to a comment (paginated).
    pub async fn find_replies(
        &self,
        parent_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        let mut query = Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .order_by_desc(comment::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(comment::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch a comment with `SELECT ... FOR UPDATE`, holding its row lock
    /// until `conn`'s transaction ends.
    pub async fn lock_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the four vote stat columns in one UPDATE.
    ///
    /// Returns the number of rows written (0 when the comment does not exist).
    pub async fn apply_stats_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        stats: &VotableStats,
    ) -> AppResult<u64> {
        let result = Comment::update_many()
            .col_expr(comment::Column::UpvoteCount, Expr::value(stats.upvote_count))
            .col_expr(comment::Column::DownvoteCount, Expr::value(stats.downvote_count))
            .col_expr(comment::Column::VoteCount, Expr::value(stats.vote_count))
            .col_expr(comment::Column::VoteScore, Expr::value(stats.vote_score))
            .filter(comment::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: &str, story_id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            story_id: story_id.to_string(),
            parent_id: parent_id.map(ToString::to_string),
            author_id: "u1".to_string(),
            body: "Nice story".to_string(),
            depth: i32::from(parent_id.is_some()),
            upvote_count: 0,
            downvote_count: 0,
            vote_count: 0,
            vote_score: 0.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::CommentNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected CommentNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_story() {
        let c1 = create_test_comment("c1", "s1", None);
        let c2 = create_test_comment("c2", "s1", Some("c1"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.find_by_story("s1").await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].parent_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_find_replies() {
        let reply = create_test_comment("c2", "s1", Some("c1"));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reply]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let replies = repo.find_replies("c1", 10, None).await.unwrap();

        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].depth, 1);
    }

    #[tokio::test]
    async fn test_apply_stats_in() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let rows = CommentRepository::apply_stats_in(&db, "c1", &VotableStats::from_counts(0, 3))
            .await
            .unwrap();

        assert_eq!(rows, 1);
    }
}
