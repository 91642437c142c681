//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Transport-level failures. Per-message failures never surface here; they
/// end up in the batch report instead.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body is not a valid batch.
    #[error("invalid batch: {0}")]
    BadRequest(String),

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
