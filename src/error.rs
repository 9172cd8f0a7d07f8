//! Unified API error type
//!
//! `AppError` carries an [`ErrorCode`], a user-facing message and an optional
//! diagnostic detail (the raw database error string). It renders as the
//! `{success: false, message, error?}` envelope every endpoint uses.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// Error classification for this service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing/empty required field (400)
    ValidationFailed,
    /// Row or file not found (404)
    NotFound,
    /// Unique-constraint violation reported by the store (409)
    DuplicateEntry,
    /// Foreign-key-referenced row reported by the store (409)
    RowReferenced,
    /// Login check failed (401)
    InvalidCredentials,
    /// A successful write returned no usable identifier (500)
    ExtractionFailed,
    /// Any other database-reported error (500)
    DatabaseError,
    /// Non-database server error (500)
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DuplicateEntry | Self::RowReferenced => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::ExtractionFailed | Self::DatabaseError | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "Required fields are missing",
            Self::NotFound => "Not found",
            Self::DuplicateEntry => "Duplicate entry",
            Self::RowReferenced => "Row is referenced by other records",
            Self::InvalidCredentials => "Invalid login credentials",
            Self::ExtractionFailed => "Could not retrieve a valid identifier from the database",
            Self::DatabaseError => "Database error",
            Self::InternalError => "Internal server error",
        }
    }
}

/// API error with structured code and optional diagnostic detail
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// Raw underlying error, surfaced in the `error` field for diagnostics
    pub detail: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            detail: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, msg)
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DuplicateEntry, msg)
    }

    pub fn referenced(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RowReferenced, msg)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Database error: logged here, message for the caller, raw error attached
    /// in the `error` field for operator debugging.
    pub fn database(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let message = message.into();
        let detail = err.to_string();
        tracing::error!(error = %detail, "{message}");
        Self {
            code: ErrorCode::DatabaseError,
            message,
            detail: Some(detail),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::database("Database operation failed", e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(detail) = self.detail {
            body["error"] = Value::String(detail);
        }
        (self.code.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::DuplicateEntry.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::RowReferenced.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::ExtractionFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_keeps_detail() {
        let err = AppError::database("Failed to save", "boom");
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Failed to save");
        assert_eq!(err.detail.as_deref(), Some("boom"));
    }
}
