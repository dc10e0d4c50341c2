// SPDX-License-Identifier: MIT
// Copyright 2026 FocusFlow contributors

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Break start attempted before the unlock delay has elapsed.
    /// Carries the remaining countdown so clients can render it.
    #[error("Breaks unlock after the first 60 minutes of a session.")]
    BreakLocked { unlock_in_seconds: i64 },

    #[error("Notifier error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(rename = "unlockInSeconds", skip_serializing_if = "Option::is_none")]
    unlock_in_seconds: Option<i64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, unlock_in_seconds) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::BreakLocked { unlock_in_seconds } => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                Some(*unlock_in_seconds),
            ),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream collaborator error");
                (StatusCode::BAD_GATEWAY, "upstream error".to_string(), None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error,
            unlock_in_seconds,
        };

        (status, Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
