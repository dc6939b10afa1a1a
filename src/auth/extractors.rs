use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::{auth::repo_types::User, error::AppError, state::AppState};

/// The user owning the request's bearer token.
pub struct AuthUser(pub User);

/// Token carried by `Authorization: Bearer <token>`, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A missing or malformed header is just a lookup that finds nobody.
        let Some(token) = bearer_token(&parts.headers) else {
            warn!("missing or malformed Authorization header");
            return Err(AppError::Unauthorized);
        };

        match state
            .users
            .find_by_token(token)
            .await
            .map_err(AppError::upstream)?
        {
            Some(user) => {
                debug!(user_id = %user.id, "request authenticated");
                Ok(AuthUser(user))
            }
            None => {
                warn!("unknown bearer token");
                Err(AppError::Unauthorized)
            }
        }
    }
}
