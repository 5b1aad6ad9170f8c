//! Error handling module for the catalog gateway.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::client::{ClientError, ValidationError};
use crate::remote::RemoteError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const REJECTED: &str = "REJECTED";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No caller identity supplied
    Unauthorized(String),
    /// Caller is known but not permitted
    Forbidden(String),
    /// Route target not found
    NotFound(String),
    /// Input rejected before any remote call
    Validation(String),
    /// The remote backend refused the call
    Rejected(String),
    /// The remote backend could not be reached or answered garbage
    Remote(String),
    /// The backend connection or admin check is unavailable; the caller may retry
    Unavailable(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Rejected(_) => codes::REJECTED,
            AppError::Remote(_) => codes::REMOTE_ERROR,
            AppError::Unavailable(_) => codes::UNAVAILABLE,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Rejected(msg)
            | AppError::Remote(msg)
            | AppError::Unavailable(msg) => msg.clone(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn retryable(&self) -> bool {
        matches!(self, AppError::Unavailable(_) | AppError::Remote(_))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotReady => AppError::Unavailable(err.to_string()),
            RemoteError::Rejected(msg) => AppError::Rejected(msg),
            RemoteError::Transport(_) | RemoteError::Decode(_) => {
                tracing::error!("Remote error: {}", err);
                AppError::Remote(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(e) => e.into(),
            ClientError::Remote(e) => e.into(),
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: u64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: u64) -> Self {
        let details = error
            .retryable()
            .then(|| serde_json::json!({ "retryable": true }));

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
#[derive(Debug)]
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: u64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
