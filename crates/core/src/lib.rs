//! Core business logic for storyhub.
//!
//! Services sit between the HTTP surface and the repositories. The vote
//! path is the interesting one: [`VoteService::cast`] mutates a vote and
//! re-derives the target's stats through [`VoteAggregator`] in a single
//! transaction, then publishes a [`VoteEvent`].

pub mod services;

pub use services::*;
