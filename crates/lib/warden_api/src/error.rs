//! Application error types.

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warden_core::auth::AuthError;
use warden_core::auth::validator::Rejection;
use warden_core::permissions::engine::DenyReason;

use crate::models::ErrorResponse;

/// Set on 401 responses caused by an expired token.
pub const TOKEN_EXPIRED_HEADER: HeaderName = HeaderName::from_static("token-expired");

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", "Token expired"),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "Service temporarily unavailable",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        let mut response = (status, body).into_response();
        if matches!(self, AppError::TokenExpired) {
            response
                .headers_mut()
                .insert(TOKEN_EXPIRED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        error!(error = %e, "Auth dependency failure");
        match e {
            AuthError::DependencyUnavailable(msg) => AppError::Unavailable(msg),
            AuthError::Configuration(msg) | AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Expired => AppError::TokenExpired,
            Rejection::SessionRevoked => AppError::Unauthorized("Session revoked".into()),
            Rejection::Malformed(_) => AppError::Unauthorized("Invalid token".into()),
        }
    }
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        AppError::Forbidden(reason.to_string())
    }
}
