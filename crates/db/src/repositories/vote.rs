//! Vote repository.

use std::sync::Arc;

use crate::entities::{Votable, Vote, VoteDirection, vote};
use chrono::Utc;
use storyhub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Expr,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

fn scoped(votable: &Votable) -> Select<Vote> {
    Vote::find()
        .filter(vote::Column::VotableType.eq(votable.kind()))
        .filter(vote::Column::VotableId.eq(votable.id()))
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote a user cast on a votable.
    pub async fn find_by_voter(
        &self,
        voter_id: &str,
        votable: &Votable,
    ) -> AppResult<Option<vote::Model>> {
        Self::find_by_voter_in(self.db.as_ref(), voter_id, votable).await
    }

    /// Get votes on a votable (paginated, newest first).
    pub async fn find_by_votable(
        &self,
        votable: &Votable,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        let mut query = scoped(votable).order_by_desc(vote::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(vote::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the vote a user cast on a votable, on `conn`.
    pub async fn find_by_voter_in<C: ConnectionTrait>(
        conn: &C,
        voter_id: &str,
        votable: &Votable,
    ) -> AppResult<Option<vote::Model>> {
        scoped(votable)
            .filter(vote::Column::VoterId.eq(voter_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count votes of one direction on a votable, on `conn`.
    pub async fn count_by_direction_in<C: ConnectionTrait>(
        conn: &C,
        votable: &Votable,
        direction: VoteDirection,
    ) -> AppResult<u64> {
        scoped(votable)
            .filter(vote::Column::Direction.eq(direction))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote, on `conn`.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change the direction of an existing vote, on `conn`.
    pub async fn set_direction_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        direction: VoteDirection,
    ) -> AppResult<()> {
        Vote::update_many()
            .col_expr(vote::Column::Direction, Expr::value(direction))
            .col_expr(vote::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(vote::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a vote, on `conn`.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        Vote::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
