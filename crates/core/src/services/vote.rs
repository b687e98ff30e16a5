//! Vote service.
//!
//! Casting a vote mutates the voter's vote row and recalculates the target's
//! stats inside one transaction that holds the target's row lock, so readers
//! never see a vote without its stats and concurrent casts on the same
//! target serialize.

use crate::services::event_publisher::{
    EventPublisherService, NoOpEventPublisher, VoteAction, VoteEvent,
};
use crate::services::vote_aggregator::{ConnectionStatsStore, VoteAggregator};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use storyhub_common::{AppError, AppResult, IdGenerator};
use storyhub_db::{
    entities::{Votable, VotableStats, VoteDirection, vote},
    repositories::{CommentRepository, StoryRepository, VoteRepository},
};

/// Result of a cast or retract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastOutcome {
    pub action: VoteAction,
    /// The voter's direction after the call, `None` if they no longer have a vote.
    pub direction: Option<VoteDirection>,
    pub stats: VotableStats,
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    db: Arc<DatabaseConnection>,
    vote_repo: VoteRepository,
    aggregator: VoteAggregator,
    event_publisher: EventPublisherService,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    ///
    /// Events go nowhere until [`set_event_publisher`](Self::set_event_publisher) is called.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, vote_repo: VoteRepository) -> Self {
        Self {
            db,
            vote_repo,
            aggregator: VoteAggregator::new(),
            event_publisher: Arc::new(NoOpEventPublisher),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = event_publisher;
    }

    /// Cast a vote.
    ///
    /// - no prior vote: a vote is created
    /// - prior vote in the same direction: it is removed (toggle-off)
    /// - prior vote in the other direction: it is flipped
    pub async fn cast(
        &self,
        voter_id: &str,
        votable: &Votable,
        direction: VoteDirection,
    ) -> AppResult<CastOutcome> {
        let txn = self
            .db
            .as_ref()
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::lock_votable(&txn, votable).await?;

        let existing = VoteRepository::find_by_voter_in(&txn, voter_id, votable).await?;
        let action = match existing {
            None => {
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    voter_id: Set(voter_id.to_string()),
                    votable_type: Set(votable.kind()),
                    votable_id: Set(votable.id().to_string()),
                    direction: Set(direction),
                    created_at: Set(Utc::now().into()),
                    updated_at: Set(None),
                };
                VoteRepository::create_in(&txn, model).await?;
                VoteAction::Created
            }
            Some(prior) if prior.direction == direction => {
                VoteRepository::delete_in(&txn, &prior.id).await?;
                VoteAction::Removed
            }
            Some(prior) => {
                VoteRepository::set_direction_in(&txn, &prior.id, direction).await?;
                VoteAction::Flipped
            }
        };

        let stats = self
            .aggregator
            .recalculate(&ConnectionStatsStore::new(&txn), votable)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome = CastOutcome {
            action,
            direction: (action != VoteAction::Removed).then_some(direction),
            stats,
        };

        tracing::info!(
            voter_id = %voter_id,
            votable = %votable,
            action = ?outcome.action,
            "Vote cast"
        );

        self.publish(voter_id, votable, &outcome).await;
        Ok(outcome)
    }

    /// Remove the voter's vote on a votable.
    pub async fn retract(&self, voter_id: &str, votable: &Votable) -> AppResult<CastOutcome> {
        let txn = self
            .db
            .as_ref()
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::lock_votable(&txn, votable).await?;

        let prior = VoteRepository::find_by_voter_in(&txn, voter_id, votable)
            .await?
            .ok_or_else(|| AppError::NotFound("Vote not found".to_string()))?;
        VoteRepository::delete_in(&txn, &prior.id).await?;

        let stats = self
            .aggregator
            .recalculate(&ConnectionStatsStore::new(&txn), votable)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome = CastOutcome {
            action: VoteAction::Removed,
            direction: None,
            stats,
        };

        tracing::info!(voter_id = %voter_id, votable = %votable, "Vote retracted");

        self.publish(voter_id, votable, &outcome).await;
        Ok(outcome)
    }

    /// Get the voter's current vote on a votable.
    pub async fn get_vote(
        &self,
        voter_id: &str,
        votable: &Votable,
    ) -> AppResult<Option<vote::Model>> {
        self.vote_repo.find_by_voter(voter_id, votable).await
    }

    /// Get votes on a votable.
    pub async fn list_votes(
        &self,
        votable: &Votable,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo
            .find_by_votable(votable, limit, until_id)
            .await
    }

    /// Recalculate a votable's stats without changing any vote.
    ///
    /// Use this to repair stats left stale by a failed write.
    pub async fn recalculate(&self, votable: &Votable) -> AppResult<VotableStats> {
        let txn = self
            .db
            .as_ref()
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::lock_votable(&txn, votable).await?;
        let stats = self
            .aggregator
            .recalculate(&ConnectionStatsStore::new(&txn), votable)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(votable = %votable, "Vote stats recalculated");
        Ok(stats)
    }

    /// Take the target's row lock, failing if it does not exist.
    async fn lock_votable<C: ConnectionTrait>(conn: &C, votable: &Votable) -> AppResult<()> {
        match votable {
            Votable::Story(id) => {
                StoryRepository::lock_in(conn, id)
                    .await?
                    .ok_or_else(|| AppError::StoryNotFound(id.clone()))?;
            }
            Votable::Comment(id) => {
                CommentRepository::lock_in(conn, id)
                    .await?
                    .ok_or_else(|| AppError::CommentNotFound(id.clone()))?;
            }
        }
        Ok(())
    }

    async fn publish(&self, voter_id: &str, votable: &Votable, outcome: &CastOutcome) {
        let event = VoteEvent {
            votable: votable.clone(),
            voter_id: voter_id.to_string(),
            action: outcome.action,
            direction: outcome.direction,
            stats: outcome.stats,
        };
        if let Err(e) = self.event_publisher.publish_vote_changed(&event).await {
            tracing::warn!(error = %e, "Failed to publish vote changed event");
        }
    }
}
