//! # API Errors
//!
//! Every handler returns `Result<_, ApiError>`. The conversions below decide
//! what a till sees:
//!
//! ```text
//! JsonRejection / QueryRejection ──► 400 VALIDATION_ERROR
//! ValidationError ─────────────────► 400 VALIDATION_ERROR
//! NotFound ────────────────────────► 404 NOT_FOUND
//! overpayment / settled credit ────► 422 PAYMENT_REJECTED
//! storage failure ─────────────────► 500 DATABASE_ERROR (details logged only)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

/// JSON error body: `{"code": "PAYMENT_REJECTED", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// The ledger refused a payment; nothing was recorded.
    PaymentRejected,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::PaymentRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Logs `detail` and answers with `public` so SQL never reaches a client.
    fn storage(detail: &DbError, public: &str) -> Self {
        tracing::error!(error = %detail, "Storage failure");
        ApiError::new(ErrorCode::DatabaseError, public)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Core(e) => e.into(),
            DbError::UniqueViolation { constraint } => ApiError::validation(format!(
                "A record with the same {} already exists",
                constraint
            )),
            DbError::ForeignKeyViolation { .. } | DbError::ConstraintViolation(_) => {
                tracing::warn!(error = %err, "Write refused by schema");
                ApiError::validation("Request violates a ledger constraint")
            }
            DbError::PoolExhausted => ApiError::storage(&err, "Database is busy, try again"),
            DbError::TransactionFailed(_) => {
                ApiError::storage(&err, "Database transaction failed")
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Internal(_) => ApiError::storage(&err, "Database operation failed"),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            rejected @ (CoreError::PaymentExceedsRemaining { .. }
            | CoreError::PaymentExceedsOutstanding { .. }
            | CoreError::CreditAlreadySettled(_)) => {
                ApiError::new(ErrorCode::PaymentRejected, rejected.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
