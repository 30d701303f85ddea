// ============================================================================
// FamEdu API - Error Mapping
// File: crates/famedu-api/src/error.rs
// ============================================================================
//! Converts service errors into the JSON error envelope.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use famedu_core::DomainError;
use thiserror::Error;
use tracing::{error, warn};

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => {
                warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Authentication required".into())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Domain(e) => match e {
                DomainError::ValidationError(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                DomainError::PasswordTooShort
                | DomainError::PasswordTooLong
                | DomainError::PasswordTooWeak => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                DomainError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "Invalid username or password".into(),
                ),
                DomainError::InvalidToken(reason) => {
                    warn!("Rejected token: {}", reason);
                    (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "Invalid or expired token".into())
                }
                DomainError::UserNotActive => (
                    StatusCode::FORBIDDEN,
                    "ACCOUNT_INACTIVE",
                    "This account has been deactivated".into(),
                ),
                DomainError::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    "You do not have permission to perform this action".into(),
                ),
                DomainError::AccountLocked { retry_after_minutes } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "ACCOUNT_LOCKED",
                    format!(
                        "Too many failed login attempts. Try again in {} minute(s)",
                        retry_after_minutes
                    ),
                ),
                DomainError::UserNotFound | DomainError::FamilyNotFound => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
                }
                DomainError::UsernameAlreadyExists(_) | DomainError::FamilyNameAlreadyExists(_) => {
                    (StatusCode::CONFLICT, "CONFLICT", e.to_string())
                }
                DomainError::PasswordHashError(_)
                | DomainError::TokenGenerationError(_)
                | DomainError::DatabaseError(_)
                | DomainError::InternalError(_) => {
                    error!("Internal error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An unexpected error occurred".into(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let mut response = (status, Json(ApiResponse::error(code, &message))).into_response();

        if let ApiError::Domain(DomainError::AccountLocked { retry_after_minutes }) = self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_minutes.max(1) * 60),
            );
        }

        response
    }
}
