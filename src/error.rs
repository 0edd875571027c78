use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::services::AccountError;

/// Body written for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("name already exists, please choose another name")]
    NameTaken,
    #[error("barcode is already registered")]
    BarcodeTaken,
    #[error("email is already registered")]
    EmailTaken,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::NameTaken => (StatusCode::CONFLICT, "NAME_TAKEN"),
            AppError::BarcodeTaken => (StatusCode::CONFLICT, "BARCODE_TAKEN"),
            AppError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AppError::Persistence(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => AppError::Validation(msg),
            AccountError::NameTaken => AppError::NameTaken,
            AccountError::BarcodeTaken => AppError::BarcodeTaken,
            AccountError::EmailTaken => AppError::EmailTaken,
            AccountError::Persistence(e) => AppError::Persistence(e),
            AccountError::Hash(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            // detail stays in the log
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorBody { code, message })).into_response()
    }
}
