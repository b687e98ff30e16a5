//! Repositories.
//!
//! Methods on a repository run against its own pooled connection. The
//! associated `*_in` functions take any [`sea_orm::ConnectionTrait`] so the
//! vote path can run them inside a single transaction.

#![allow(missing_docs)]

pub mod comment;
pub mod story;
pub mod user;
pub mod vote;

pub use comment::CommentRepository;
pub use story::StoryRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
