use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::dao::storage::StorageError;
use crate::state::session::SubmitError;
use crate::state::state_machine::{InvalidTransition, UnknownAction};

/// Errors that can occur in service layer operations.
///
/// Checks run in a fixed order callers depend on: authorization first, then
/// existence/ownership, then state and input validation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Caller token is missing or does not resolve to a user.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Valid caller, but not the owner of the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Referenced session/quiz/player does not resolve or does not belong to
    /// the stated parent.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation is illegal in the session's current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Malformed input from the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<UnknownAction> for ServiceError {
    fn from(err: UnknownAction) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<SubmitError> for ServiceError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NotOpen | SubmitError::WrongQuestion => {
                ServiceError::InvalidState(err.to_string())
            }
            SubmitError::PositionOutOfRange
            | SubmitError::EmptyAnswers
            | SubmitError::DuplicateAnswer
            | SubmitError::UnknownAnswer => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request: invalid input or an action illegal for the current phase.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Caller is not the resource owner.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidState(message) => AppError::BadRequest(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
