use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{repo_types::UserId, services::AuthError};
use crate::{error::ApiError, state::AppState};

/// Extracts and validates the bearer token, returning the user ID.
#[derive(Debug)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::InvalidToken)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser(state.auth.authenticate(token)?))
    }
}
