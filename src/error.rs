//! Error types for HomeFeed
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! Every error body carries a machine-readable `message` code.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// The first group of variants is the request-level taxonomy handlers
/// abort with; the second group wraps infrastructure failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer credential on a request that requires one (401)
    #[error("Missing credential")]
    MissingCredential,

    /// Bearer credential is malformed or mis-signed (401)
    #[error("Invalid token")]
    DecodeError,

    /// Credential decoded to a user that does not exist (401)
    #[error("Unknown user")]
    UnknownUser,

    /// Domain entity absent (404)
    #[error("Resource not found")]
    NotFound,

    /// Missing or malformed field in the request (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Comment target posting id is missing or unknown (400)
    #[error("Invalid posting id")]
    InvalidPostingId,

    /// Upstream refused the request, e.g. an expired provider token (401)
    #[error("Upstream rejected the request")]
    UpstreamRejected,

    /// Upstream unreachable or returned an unusable response (400)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Uniqueness violation (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// R2 storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Extractor rejections are client errors; report them in the same
// `{"message": ...}` shape instead of axum's plain-text 4xx bodies.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status and wire code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MissingCredential => (StatusCode::UNAUTHORIZED, "KEY_ERROR"),
            AppError::DecodeError => (StatusCode::UNAUTHORIZED, "JWT_DECODE_ERROR"),
            AppError::UnknownUser => (StatusCode::UNAUTHORIZED, "INVALID_USER"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "DOES_NOT_EXIST"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "KEY_ERROR"),
            AppError::InvalidPostingId => (StatusCode::BAD_REQUEST, "INVALID_POSTING_ID"),
            AppError::UpstreamRejected => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::Upstream(_) => (StatusCode::BAD_REQUEST, "UPSTREAM_ERROR"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Client errors carry their detail; server errors are logged
    /// and answered with the bare code.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, code) = self.status_and_code();

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[code]).inc();

        let body = match &self {
            AppError::Validation(detail)
            | AppError::Upstream(detail)
            | AppError::Conflict(detail) => serde_json::json!({
                "message": code,
                "detail": detail,
            }),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
                serde_json::json!({ "message": code })
            }
            _ => serde_json::json!({ "message": code }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
