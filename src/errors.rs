use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// JSON error envelope handed to the HTTP layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Failure taxonomy for the ledger and request services.
///
/// Every failure is synchronous and carries a stable kind plus a
/// human-readable message. The embedding HTTP layer maps kinds to
/// status codes via the `IntoResponse` impl below.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// True when the database aborted the transaction to preserve
    /// isolation rather than because the write itself was wrong.
    /// Postgres reports SQLSTATE 40001 ("could not serialize access");
    /// SQLite reports a busy/locked conflict. Both are safe to retry.
    pub fn is_serialization_failure(&self) -> bool {
        match self {
            ServiceError::DatabaseError(err) => {
                let msg = err.to_string();
                msg.contains("could not serialize")
                    || msg.contains("40001")
                    || msg.contains("database is locked")
            }
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationError(_) | ServiceError::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal failure details stay out of client responses.
        let message = match &self {
            ServiceError::NotFound(msg)
            | ServiceError::ValidationError(msg)
            | ServiceError::InvalidTransition(msg) => msg.clone(),
            other => {
                tracing::error!(error = %other, "internal service error");
                "Internal server error".to_string()
            }
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failures_are_retryable() {
        let pg = ServiceError::db_error(
            "could not serialize access due to read/write dependencies among transactions",
        );
        let sqlite = ServiceError::db_error("error returned from database: database is locked");
        let plain = ServiceError::db_error("connection reset");
        let validation = ServiceError::ValidationError("Quantity must not be zero".into());

        assert!(pg.is_serialization_failure());
        assert!(sqlite.is_serialization_failure());
        assert!(!plain.is_serialization_failure());
        assert!(!validation.is_serialization_failure());
    }

    #[test]
    fn error_envelope_serializes_flat_json() {
        let body = ErrorResponse {
            error: "Bad Request".to_string(),
            message: "Quantity must not be zero".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"], "Bad Request");
        assert_eq!(value["message"], "Quantity must not be zero");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("Part 42 not found".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_and_transition_map_to_400() {
        let v = ServiceError::ValidationError("qty must not be zero".into());
        let t = ServiceError::InvalidTransition("Cannot cancel a fulfilled request".into());
        assert_eq!(v.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(t.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_errors_map_to_500() {
        let err = ServiceError::db_error("connection reset");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
