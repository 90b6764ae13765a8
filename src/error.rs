// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Ineligibility for a reward is NOT an error: it is a normal negative
//! result returned by the reward engine. Only unexpected conditions
//! (auth, persistence, upstream health service, misconfiguration) live
//! here.

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

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Health service error: {0}")]
    HealthApi(String),

    #[error("Reward catalog is empty: {0}")]
    CatalogEmpty(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker for a health-service call that timed out.
    pub const HEALTH_TIMEOUT: &'static str = "health_timeout";

    /// Marker for a health-service token that was rejected upstream.
    pub const HEALTH_TOKEN_ERROR: &'static str = "health_token_rejected";

    /// Whether this error is a timed-out health-service call.
    ///
    /// The step adapter treats these as "no update this cycle".
    pub fn is_health_timeout(&self) -> bool {
        matches!(self, AppError::HealthApi(msg) if msg == Self::HEALTH_TIMEOUT)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::HealthApi(msg) => {
                (StatusCode::BAD_GATEWAY, "health_error", Some(msg.clone()))
            }
            AppError::CatalogEmpty(msg) => {
                // Content/configuration problem, not a user-progress problem.
                tracing::error!(error = %msg, "Reward catalog empty");
                (StatusCode::INTERNAL_SERVER_ERROR, "catalog_empty", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
