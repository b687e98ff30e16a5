//! HTTP API layer for storyhub.
//!
//! - **Endpoints**: stories, comments, votes and users, all `POST` with JSON bodies
//! - **Extractors**: the acting user
//! - **Middleware**: application state and acting-user resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
