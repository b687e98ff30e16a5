//! API endpoints.

mod comments;
mod stories;
mod users;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/stories", stories::router())
        .nest("/comments", comments::router())
        .nest("/votes", votes::router())
}

const fn default_limit() -> u64 {
    10
}

const fn max_limit() -> u64 {
    100
}
