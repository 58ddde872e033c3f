//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use updown_common::AppError;

/// Authenticated principal, set by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub String);

/// Admin authentication extractor.
///
/// Rejects with [`AppError::Unauthorized`] when the auth middleware did
/// not verify a bearer token on this request.
#[derive(Debug, Clone)]
pub struct AdminToken(pub String);

impl<S> FromRequestParts<S> for AdminToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthPrincipal>()
            .map(|p| Self(p.0.clone()))
            .ok_or(AppError::Unauthorized)
    }
}
