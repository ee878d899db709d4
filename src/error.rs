use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::TransactionError;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{entity} {field} already exists")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} referenced by {field} does not exist")]
    ReferenceNotFound {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{0} cannot be its own parent")]
    DirectCycle(String),

    #[error("{0} cannot be moved beneath one of its descendants")]
    IndirectCycle(String),

    #[error("{entity} is in use by {by}")]
    InUse { entity: &'static str, by: String },

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists { .. } => "already_exists",
            AppError::ReferenceNotFound { .. } => "reference_not_found",
            AppError::DirectCycle(_) => "direct_cycle",
            AppError::IndirectCycle(_) => "indirect_cycle",
            AppError::InUse { .. } => "in_use",
            AppError::Forbidden(_) => "forbidden",
            AppError::StorageConflict(_) => "storage_conflict",
            AppError::Validation(_) => "validation_error",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. } | AppError::InUse { .. } => StatusCode::CONFLICT,
            AppError::ReferenceNotFound { .. }
            | AppError::DirectCycle(_)
            | AppError::IndirectCycle(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StorageConflict(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match &self {
            AppError::StorageConflict(msg) => {
                tracing::error!("Storage conflict: {}", msg);
                ("Storage Conflict".to_string(), Some(msg.clone()))
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                ("Database Error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal Server Error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            message,
            kind: self.kind(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Errors raised inside a mutating transaction. Business-rule failures pass
/// through untouched; every storage-level failure becomes `StorageConflict`.
impl From<TransactionError<AppError>> for AppError {
    fn from(err: TransactionError<AppError>) -> Self {
        match err {
            TransactionError::Connection(e) => AppError::StorageConflict(e.to_string()),
            TransactionError::Transaction(AppError::Database(e)) => {
                AppError::StorageConflict(e.to_string())
            }
            TransactionError::Transaction(e) => e,
        }
    }
}

// Malformed requests share the validation shape of service-level checks
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting Option to AppError::NotFound
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}
