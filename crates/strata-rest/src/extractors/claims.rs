//! JWT claims extractor.

use crate::responses::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use strata_core::{StrataError, UserId};
use strata_security::Claims;

/// Claims of the caller, placed in the request extensions by
/// [`auth_middleware`](crate::middleware::auth_middleware).
///
/// Only the token is checked here. A user deactivated or soft-deleted after
/// the token was issued keeps it until it expires; handlers that must refuse
/// such callers load the user and check it, as `/auth/me` does.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    /// The caller's user id.
    pub fn id(&self) -> Result<UserId, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError(StrataError::InvalidToken("Malformed subject".to_string())))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError(StrataError::unauthorized("Missing authorization header")))?;

        if !auth_header.starts_with("Bearer ") {
            return Err(AppError(StrataError::unauthorized(
                "Invalid authorization format",
            )));
        }

        // Absent claims mean the middleware rejected the token.
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError(StrataError::unauthorized("Invalid or expired token")))?;

        Ok(AuthenticatedUser(claims))
    }
}
