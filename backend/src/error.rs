//! Error handling for the Stock Ledger
//!
//! Every service returns [`AppResult`]; the HTTP layer renders errors as a
//! JSON body with a stable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ItemRef;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Item not found: {0}")]
    ItemNotFound(ItemRef),

    #[error("Insufficient stock for {item_name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: Uuid,
        item_name: String,
        available: i64,
        requested: i64,
    },

    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Stock event {0} was already applied")]
    DuplicateEvent(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Field-level validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Conflicts are worth retrying; everything else is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransactionConflict(_))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl From<shared::TransitionError> for AppError {
    fn from(error: shared::TransitionError) -> Self {
        AppError::InvalidStateTransition(error.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::ItemNotFound(item) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "ITEM_NOT_FOUND".to_string(),
                    message: format!("Item {} not found", item),
                    field: None,
                },
            ),
            AppError::InsufficientStock { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::TransactionConflict(_) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "TRANSACTION_CONFLICT".to_string(),
                    message: "The items were modified concurrently. Please try again.".to_string(),
                    field: None,
                },
            ),
            AppError::DuplicateEvent(_) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_EVENT".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_item() {
        let err = AppError::InsufficientStock {
            item_id: Uuid::new_v4(),
            item_name: "Keripik".to_string(),
            available: 4,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Keripik: available 4, requested 10"
        );
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(AppError::TransactionConflict("serialization".into()).is_retryable());
        assert!(!AppError::NotFound("Sale".into()).is_retryable());
        assert!(!AppError::DuplicateEvent("evt-1".into()).is_retryable());
    }
}
