//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod story;
pub mod user;
pub mod votable;
pub mod vote;

pub use comment::Entity as Comment;
pub use story::Entity as Story;
pub use user::Entity as User;
pub use votable::{DOWNVOTE_PENALTY_WEIGHT, Votable, VotableStats};
pub use vote::Entity as Vote;
pub use vote::{VotableKind, VoteDirection};
