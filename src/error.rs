//! Error types for Athenaeum server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::policy::{FailureKind, LendingError};

/// Numeric error codes returned alongside every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    MaxBorrowsReached = 11,
    BadValue = 18,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Lending refused: {0}")]
    Lending(#[from] LendingError),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

fn lending_status(err: &LendingError) -> (StatusCode, ErrorCode) {
    match err.kind() {
        FailureKind::PermissionDenied => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
        FailureKind::ResourceUnavailable => (StatusCode::CONFLICT, ErrorCode::ItemNotAvailable),
        FailureKind::DuplicateState => (StatusCode::CONFLICT, ErrorCode::Duplicate),
        FailureKind::LimitExceeded => {
            (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MaxBorrowsReached)
        }
        FailureKind::NotFound => (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem),
        FailureKind::Validation => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String, String) {
        match self {
            AppError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::NotAuthorized,
                "NotAuthorized".to_string(),
                msg.clone(),
            ),
            AppError::Authorization(msg) => (
                StatusCode::FORBIDDEN,
                ErrorCode::NotAuthorized,
                "NotAuthorized".to_string(),
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorCode::NoSuchItem,
                "NoSuchItem".to_string(),
                msg.clone(),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::BadValue,
                "BadValue".to_string(),
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "DbFailure".to_string(),
                    "Database error".to_string(),
                )
            }
            AppError::Lending(err) => {
                let (status, code) = lending_status(err);
                (status, code, err.code().to_string(), err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error,
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
