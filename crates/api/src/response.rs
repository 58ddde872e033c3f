//! API response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The JSON envelope every endpoint returns: a `data` payload, an
/// `error` block, or (for soft-fail validation) both at once, so the
/// rejected candidate ships alongside its structured errors.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Error block of the envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success: payload only.
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Rejection: the attempted payload plus an error block, rendered as
    /// 400 so clients see the structured detail and the failure status
    /// together.
    pub fn rejected(data: T, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    const fn status(&self) -> StatusCode {
        if self.error.is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
