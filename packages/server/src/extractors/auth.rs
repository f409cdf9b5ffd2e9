use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
pub struct AuthUser {
    pub user_id: Uuid,
    /// Recorded on handler spans next to `user_id`.
    pub login: String,
}

/// Optional viewer identity. Never rejects: a missing or undecodable token
/// simply yields an anonymous viewer.
pub struct Viewer(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = bearer_token(parts).ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        jwt::verify(&state.config.auth.jwt_secret, token)
            .map(AuthUser::from)
            .map_err(|_| AppError::TokenInvalid)
    }
}

impl From<jwt::Claims> for AuthUser {
    fn from(claims: jwt::Claims) -> Self {
        Self {
            user_id: claims.uid,
            login: claims.sub,
        }
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let viewer = bearer_token(parts)
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(|token| jwt::verify(&state.config.auth.jwt_secret, token).ok())
            .map(|claims| claims.uid);

        Ok(Viewer(viewer))
    }
}
