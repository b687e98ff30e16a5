//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use storyhub_common::AppError;
use storyhub_db::entities::user;

/// The user on whose behalf the request acts.
///
/// Resolved from the `X-User-Id` header by
/// [`acting_user_middleware`](crate::middleware::acting_user_middleware).
#[derive(Debug, Clone)]
pub struct ActingUser(pub user::Model);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(ActingUser)
            .ok_or(AppError::Unauthorized)
    }
}
