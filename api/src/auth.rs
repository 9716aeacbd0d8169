use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use giftwise_core::auth::{ACCESS_TOKEN_PREFIX, hash_token};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::User;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Authorization header must use Bearer scheme"))?;

        if !token.starts_with(ACCESS_TOKEN_PREFIX) {
            return Err(unauthorized("Invalid token format"));
        }

        let user = state
            .store
            .user_for_token(&hash_token(token))
            .await?
            .ok_or_else(|| unauthorized("Invalid or expired access token"))?;

        Ok(AuthenticatedUser { user })
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized {
        message: message.to_string(),
    }
}
