//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use storyhub_core::{CommentService, StoryService, UserService, VoteService};

/// Header carrying the acting user's id, set by the fronting auth layer.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub story_service: StoryService,
    pub comment_service: CommentService,
    pub vote_service: VoteService,
}

/// Resolve the acting user from the `X-User-Id` header.
///
/// Unknown ids are left unresolved; endpoints that need a user reject with 401.
/// A lookup that fails server-side ends the request with that error.
pub async fn acting_user_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Some(user_id) = user_id {
        match state.user_service.get(&user_id).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => return e.into_response(),
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, "Acting user not resolved");
            }
        }
    }

    next.run(req).await
}
