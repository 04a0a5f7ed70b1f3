//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::cancellation::CancellationError;
use crate::services::employees::EnrollError;
use crate::services::face::FaceVerifyError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Ownership check failed (wrong password, unrecognized face)
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", e.to_string()),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<CancellationError> for AppError {
    fn from(err: CancellationError) -> Self {
        match err {
            CancellationError::Validation => AppError::BadRequest(err.to_string()),
            CancellationError::NotFound => AppError::NotFound(err.to_string()),
            CancellationError::Unauthorized => AppError::Unauthorized(err.to_string()),
            CancellationError::Render(e) => AppError::Internal(e.to_string()),
            CancellationError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<EnrollError> for AppError {
    fn from(err: EnrollError) -> Self {
        match err {
            EnrollError::Validation(_) => AppError::BadRequest(err.to_string()),
            EnrollError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<FaceVerifyError> for AppError {
    fn from(err: FaceVerifyError) -> Self {
        match err {
            FaceVerifyError::NoImage => AppError::BadRequest(err.to_string()),
            FaceVerifyError::NoReferenceSet => AppError::NotFound(err.to_string()),
            FaceVerifyError::NotRecognized => AppError::Unauthorized(err.to_string()),
            FaceVerifyError::Repository(e) => AppError::Repository(e),
            FaceVerifyError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
