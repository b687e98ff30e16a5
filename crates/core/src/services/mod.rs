//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod event_publisher;
pub mod story;
pub mod user;
pub mod vote;
pub mod vote_aggregator;

pub use comment::{CommentService, CreateCommentInput};
pub use event_publisher::{
    BroadcastEventPublisher, EventPublisher, EventPublisherService, NoOpEventPublisher,
    VoteAction, VoteEvent,
};
pub use story::{CreateStoryInput, StoryService};
pub use user::{CreateUserInput, UserService};
pub use vote::{CastOutcome, VoteService};
pub use vote_aggregator::{ConnectionStatsStore, VoteAggregator, VoteStatsStore};
