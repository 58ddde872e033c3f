//! Error types for updown-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A referenced entity is missing from storage. Propagates unmasked
    /// so a vote on a deleted item cannot silently succeed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unaccepted credentials on a protected route.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad end-user input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upsert-race fallout: the unique (voter, votable) index admitted a
    /// concurrent writer and the retry found no row to update. Distinct
    /// from [`Self::Validation`]; this reflects timing, not bad input.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A caller bug (absent voter or votable reference). Always
    /// propagates; never converted into a boolean failure return.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage round-trip failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable API error code, paired so the two cannot
    /// drift apart.
    const fn meta(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::InvalidArgument(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_ARGUMENT")
            }
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.meta().0
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.meta().1
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.meta();

        if self.is_server_error() {
            tracing::error!(error = %self, code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
