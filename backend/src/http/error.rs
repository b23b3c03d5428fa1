//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
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

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Malformed path, query or body values.
    BadRequest(String),
    /// Request body sent without a JSON content type.
    UnsupportedMediaType(String),
    /// Missing or unknown caller identity, or failed login.
    Unauthorized(String),
    /// Caller is known but lacks the required role or ownership.
    Forbidden(String),
    Conflict(String),
    Internal(String),
    Repository(RepositoryError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RepositoryError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                RepositoryError::Conflict { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::UnsupportedMediaType(msg) => ApiError::new("UNSUPPORTED_MEDIA_TYPE", msg),
            AppError::Unauthorized(msg) => ApiError::new("UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => ApiError::new("FORBIDDEN", msg),
            AppError::Conflict(msg) => ApiError::new("CONFLICT", msg),
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg),
            AppError::Repository(e) => {
                let code = match &e {
                    RepositoryError::NotFound { .. } => "NOT_FOUND",
                    RepositoryError::ValidationError { .. } => "VALIDATION_ERROR",
                    RepositoryError::Conflict { .. } => "CONFLICT",
                    _ => "REPOSITORY_ERROR",
                };
                if status.is_server_error() {
                    tracing::error!("Repository failure: {}", e);
                }
                let mut error = ApiError::new(code, e.message());
                if let Some(details) = e.context().details.clone() {
                    error = error.with_details(details);
                }
                error
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
