//! Error-to-response mapping.
//!
//! Every refusal the service produces becomes a JSON body with at least an
//! `error` field. Internal failures are logged here and reported as a
//! generic 500 so storage or mail details never reach the client.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::REQUIREMENTS;
use crate::auth::TokenError;
use crate::gate::Rejection;
use crate::reset::ResetError;
use crate::store::StoreError;

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::RateLimited { retry_after_secs } => {
                let body = json!({
                    "error": "Too many requests. Please try again later.",
                    "retryAfterSeconds": retry_after_secs,
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            Rejection::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Authentication required" }))).into_response()
            }
            Rejection::Forbidden => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Access denied" }))).into_response()
            }
        }
    }
}

/// Handler-level failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid or expired token")]
    InvalidResetToken,

    #[error("Password does not meet requirements")]
    WeakPassword(Vec<String>),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidResetToken | ApiError::WeakPassword(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::WeakPassword(details) => json!({
                "error": self.to_string(),
                "details": details,
                "requirements": REQUIREMENTS,
            }),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::InvalidToken => ApiError::InvalidResetToken,
            ResetError::WeakPassword(details) => ApiError::WeakPassword(details),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
