use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// Error body for every failed API response: `{error, details?}`.
#[derive(Serialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Hash(String),
    /// Unexpected internal failure outside the database (session store,
    /// serialization). Surfaces as a plain 500.
    Internal(String),
    /// Field-level validation failures, one message per field.
    Validation(Vec<String>),
    /// No authenticated session.
    Unauthorized,
    /// Authenticated but not allowed to perform the action.
    Forbidden(String),
    NotFound,
    /// Duplicate review / duplicate participant.
    Conflict(String),
    /// Storage backend unreachable, as distinct from client errors.
    Unavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Internal(e) => write!(f, "Internal error: {e}"),
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors.join("; ")),
            AppError::Unauthorized => write!(f, "Authentication required"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::Unavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.join("; ")),
            }),
            AppError::Unauthorized => HttpResponse::Unauthorized().json(ApiErrorResponse {
                error: "Authentication required".to_string(),
                details: None,
            }),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(ApiErrorResponse {
                error: "Not authorized for this action".to_string(),
                details: Some(msg.clone()),
            }),
            AppError::NotFound => HttpResponse::NotFound().json(ApiErrorResponse {
                error: "Not found".to_string(),
                details: None,
            }),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(ApiErrorResponse {
                error: "Conflict".to_string(),
                details: Some(msg.clone()),
            }),
            AppError::Unavailable(msg) => {
                log::error!("Storage unavailable: {msg}");
                HttpResponse::ServiceUnavailable().json(ApiErrorResponse {
                    error: "Storage unavailable".to_string(),
                    details: None,
                })
            }
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(ApiErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                })
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::Unavailable(e.to_string())
            }
            sqlx::Error::Io(io) => AppError::Unavailable(io.to_string()),
            other => AppError::Db(other),
        }
    }
}

/// True when a sqlx error is a UNIQUE constraint violation.
///
/// Callers that race a check-then-insert (duplicate review, duplicate
/// participant) use this to surface the violation as a conflict instead
/// of a 500.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
