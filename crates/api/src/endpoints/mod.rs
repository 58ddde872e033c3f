//! API endpoints.

mod admin;
mod metrics;
mod votables;
mod voters;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/votes", votes::router())
        .nest("/votables", votables::router())
        .nest("/voters", voters::router())
        .nest("/admin", admin::router())
        .nest("/metrics", metrics::router())
}
