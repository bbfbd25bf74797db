use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{dao::storage::StorageError, state::match_machine::InvalidTransition};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// No verified caller identity was supplied.
    #[error("the operation requires authentication")]
    Unauthenticated,
    /// Missing or malformed payload field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Wrong state, wrong role, not-found, or a business conflict.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    /// Uniqueness violation.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Unexpected internal failure.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::FailedPrecondition(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// No verified caller identity was supplied.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Bad request with invalid input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A business precondition does not hold.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    /// Uniqueness conflict.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Stable machine-readable code surfaced to procedure callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::InvalidArgument(_) => "invalid-argument",
            AppError::FailedPrecondition(_) => "failed-precondition",
            AppError::AlreadyExists(_) => "already-exists",
            AppError::Unavailable(_) => "unavailable",
            AppError::Unknown(_) => "unknown",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::Unavailable(source.to_string()),
            ServiceError::Degraded => AppError::Unavailable("degraded mode".into()),
            ServiceError::Unauthenticated => {
                AppError::Unauthenticated("the operation requires authentication".into())
            }
            ServiceError::InvalidArgument(message) => AppError::InvalidArgument(message),
            ServiceError::FailedPrecondition(message) => AppError::FailedPrecondition(message),
            ServiceError::AlreadyExists(message) => AppError::AlreadyExists(message),
            ServiceError::Unknown(message) => AppError::Unknown(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
