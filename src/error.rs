// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::DataPoint;

/// Errors from talking to Webex (token endpoint, meetings, analytics) and
/// from shaping the analytics afterwards.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Webex request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed Webex response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The identity provider rejected the code, client credentials or refresh token.
    #[error("{message}: {description}")]
    Auth { message: String, description: String },

    #[error("Webex kept rejecting the access token after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error(
        "Meeting {meeting_id} analytics are rate limited and nothing is cached yet, \
         try again in {retry_after_secs} seconds"
    )]
    RateLimitedNoCache {
        meeting_id: String,
        retry_after_secs: u64,
    },

    #[error("Unexpected response from Webex: HTTP {code}")]
    UnexpectedStatus { code: u16 },

    #[error("Invalid request, \"dp\" parameter not recognized: {0:?}")]
    InvalidSelector(String),

    /// A session has no windows for the requested data point, so the series
    /// bounds cannot be determined.
    #[error("No {data_point} samples for media session {session}")]
    NoSamples { data_point: DataPoint, session: usize },

    #[error("Analytics cache error: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// True when the stored tokens can no longer be used and the user has
    /// to go through the OAuth flow again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            ApiError::Auth { .. } | ApiError::ExhaustedRetries { .. }
        )
    }
}

/// Errors from the SQLite-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data dump is empty")]
    EmptyPayload,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored payload is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("system random number generator failed")]
    Random,
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Too many sign-ins in progress, try again in a few minutes")]
    Busy,

    #[error(transparent)]
    Webex(#[from] ApiError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "busy",
                Some(self.to_string()),
            ),
            AppError::Webex(err) => {
                let (status, code) = match err {
                    ApiError::Auth { .. } | ApiError::ExhaustedRetries { .. } => {
                        (StatusCode::UNAUTHORIZED, "webex_auth_error")
                    }
                    ApiError::RateLimitedNoCache { .. } => {
                        (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
                    }
                    ApiError::InvalidSelector(_) | ApiError::NoSamples { .. } => {
                        (StatusCode::BAD_REQUEST, "bad_request")
                    }
                    ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                    _ => (StatusCode::BAD_GATEWAY, "webex_error"),
                };
                let details = (!status.is_server_error()).then(|| err.to_string());
                (status, code, details)
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
