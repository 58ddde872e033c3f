//! HTTP API layer for updown-rs.
//!
//! This crate provides the JSON API over the vote engine:
//!
//! - **Endpoints**: vote writes, status, listings, admin, metrics
//! - **Extractors**: admin authentication
//! - **Middleware**: pluggable bearer-token auth, request metrics
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, Authenticator, StaticTokenAuth};
