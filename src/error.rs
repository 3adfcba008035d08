//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` returned by every service and
//! handler. It maps the four client-facing error families (authorization,
//! not-found, state conflict, validation) plus server failures onto HTTP
//! statuses with a JSON body of the form `{"error": "<message>"}`.
//!
//! `From` conversions exist for the lower layers (`StoreError`,
//! `TransitionError`, `validator::ValidationErrors`, `jsonwebtoken` errors)
//! so the `?` operator can be used throughout.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::TransitionError;
use crate::store::StoreError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The caller is authenticated but lacks the role or ownership required (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Malformed request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// A referenced task, assignment or profile does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// A lifecycle or uniqueness precondition was violated (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Persistence failure (HTTP 500). The detail is logged, never sent to the client.
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Input failed `validator` rules (HTTP 422 Unprocessable Entity).
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
            AppError::DatabaseError(msg) => {
                log::error!("Database error: {}", msg);
                "An internal error occurred"
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Duplicate(msg) => AppError::Conflict(msg),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Persistence(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(error: TransitionError) -> AppError {
        AppError::Conflict(error.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}
