//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use updown_common::{Timer, get_metrics};
use updown_core::{FeedbackCatalog, VoteService};

use crate::extractors::AuthPrincipal;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub vote_service: VoteService,
    pub catalog: FeedbackCatalog,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Pluggable bearer-token verification.
///
/// Hosts supply their own policy; [`StaticTokenAuth`] is the bundled
/// single-token implementation.
pub trait Authenticator: Send + Sync {
    /// Verify a token, returning the principal name when valid.
    fn verify(&self, token: &str) -> Option<String>;
}

/// Single configured admin token.
#[derive(Debug, Clone)]
pub struct StaticTokenAuth {
    token: Option<String>,
}

impl StaticTokenAuth {
    /// Create an authenticator around the configured token. `None`
    /// disables authentication entirely (no request verifies).
    #[must_use]
    pub const fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl Authenticator for StaticTokenAuth {
    fn verify(&self, token: &str) -> Option<String> {
        match &self.token {
            Some(expected) if expected == token => Some("admin".to_string()),
            _ => None,
        }
    }
}

/// Authentication middleware.
///
/// Verifies a bearer token against the pluggable authenticator and, on
/// success, stores the principal in request extensions for extractors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Some(principal) = state.authenticator.verify(token)
    {
        req.extensions_mut().insert(AuthPrincipal(principal));
    }

    next.run(req).await
}

/// Request-metrics middleware.
pub async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let metrics = get_metrics();
    metrics.start_request();
    let timer = Timer::start();

    let response = next.run(req).await;

    metrics.end_request();
    metrics.record_http_request(response.status().as_u16(), timer.elapsed());
    response
}
