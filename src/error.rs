use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Every failure a leave operation can surface to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("The start date may not be later than the end date")]
    InvalidDateRange,

    #[error("You do not have sufficient days for this request ({requested} requested, {available} remaining)")]
    InsufficientAllocation { requested: i64, available: i32 },

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Leave request has already been actioned")]
    AlreadyActioned,

    #[error("Leave request has been cancelled")]
    Cancelled,

    #[error("{0} was changed by another request, reload and try again")]
    Conflict(&'static str),

    #[error("No rows changed while saving {0}")]
    PersistenceFailure(&'static str),

    #[error("Stored {entity} row is invalid: {reason}")]
    InvalidRow { entity: &'static str, reason: String },

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidDateRange => "INVALID_DATE_RANGE",
            AppError::InsufficientAllocation { .. } => "INSUFFICIENT_ALLOCATION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::AlreadyActioned => "ALREADY_ACTIONED",
            AppError::Cancelled => "CANCELLED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            AppError::InvalidRow { .. } | AppError::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidDateRange
            | AppError::InsufficientAllocation { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::AlreadyActioned | AppError::Cancelled | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::PersistenceFailure(_)
            | AppError::InvalidRow { .. }
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Internal Server Error".to_string()
            }
            AppError::InvalidRow { .. } => {
                tracing::error!(error = %self, "Unreadable row in database");
                "Internal Server Error".to_string()
            }
            AppError::PersistenceFailure(entity) => {
                tracing::error!(entity, "Write affected no rows");
                "Something went wrong with submitting your record".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "message": message,
            "code": self.code(),
        }))
    }
}
