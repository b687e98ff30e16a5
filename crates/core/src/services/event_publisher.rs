//! Event publisher service.
//!
//! Vote services publish a [`VoteEvent`] after the vote transaction has
//! committed, once per successful cast or retract, in completion order.
//! Publishing never blocks and a failed publish never fails the vote.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use storyhub_common::AppResult;
use storyhub_db::entities::{Votable, VotableStats, VoteDirection};
use tokio::sync::broadcast;

/// What a cast or retract did to the voter's vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// No prior vote; one was inserted.
    Created,
    /// The prior vote had the other direction and was flipped.
    Flipped,
    /// The prior vote was deleted (same-direction toggle-off or retract).
    Removed,
}

/// A committed change to a votable's vote set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
    pub votable: Votable,
    pub voter_id: String,
    pub action: VoteAction,
    /// The voter's direction after the change, `None` once removed.
    pub direction: Option<VoteDirection>,
    pub stats: VotableStats,
}

/// Trait for publishing vote events.
///
/// This allows the core services to publish events
/// without depending on a particular transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a vote changed event.
    async fn publish_vote_changed(&self, event: &VoteEvent) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for tests or when events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_vote_changed(&self, _event: &VoteEvent) -> AppResult<()> {
        Ok(())
    }
}

/// In-process publisher backed by a tokio broadcast channel.
///
/// Subscribers that fall more than `capacity` events behind lose the
/// oldest events.
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<VoteEvent>,
}

impl BroadcastEventPublisher {
    /// Create a publisher buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish_vote_changed(&self, event: &VoteEvent) -> AppResult<()> {
        // No subscribers is not an error.
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(votable = %event.votable, "No vote event subscribers");
        }
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_event(action: VoteAction) -> VoteEvent {
        VoteEvent {
            votable: Votable::Comment("c1".to_string()),
            voter_id: "u1".to_string(),
            action,
            direction: Some(VoteDirection::Up),
            stats: VotableStats::from_counts(1, 0),
        }
    }

    #[tokio::test]
    async fn test_broadcast_delivers_in_order() {
        let publisher = BroadcastEventPublisher::new(16);
        let mut rx = publisher.subscribe();

        publisher
            .publish_vote_changed(&sample_event(VoteAction::Created))
            .await
            .unwrap();
        publisher
            .publish_vote_changed(&sample_event(VoteAction::Flipped))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().action, VoteAction::Created);
        assert_eq!(rx.recv().await.unwrap().action, VoteAction::Flipped);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let publisher = BroadcastEventPublisher::default();
        let result = publisher
            .publish_vote_changed(&sample_event(VoteAction::Removed))
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let json = serde_json::to_value(sample_event(VoteAction::Created)).unwrap();
        assert_eq!(json["voterId"], "u1");
        assert_eq!(json["action"], "created");
        assert_eq!(json["votable"]["type"], "comment");
        assert_eq!(json["stats"]["voteCount"], 1);
    }
}
