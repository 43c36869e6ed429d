//! # Database Errors
//!
//! ```text
//! sqlx::Error ───────┐
//! MigrateError ──────┼──► DbError ──► ApiError (tally-api)
//! CoreError ─────────┘      │
//!   (ledger refusal)        └── Core(..) passes ledger rejections through untouched
//! ```

use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Everything a repository call can fail with.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unknown credit, sale, or a customer key with no credits.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index fired, e.g. a second credit for one sale.
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK or trigger refused the write.
    ///
    /// Updating or deleting a row in `credit_payments` lands here.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The ledger refused the operation. Raised before the transaction
    /// writes anything.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Commit failed; the transaction left no trace.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Sorts a SQLite error message into a constraint variant.
    ///
    /// SQLite reports `UNIQUE constraint failed: <table>.<column>`,
    /// `FOREIGN KEY constraint failed`, `CHECK constraint failed: <expr>`,
    /// and trigger `RAISE(ABORT, ..)` text verbatim.
    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
            DbError::UniqueViolation {
                constraint: constraint.to_string(),
            }
        } else if msg.contains("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else if msg.contains("CHECK constraint failed") || msg.contains("append-only") {
            DbError::ConstraintViolation(msg.to_string())
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_messages_map_to_variants() {
        assert!(matches!(
            DbError::from_sqlite_message("UNIQUE constraint failed: credits.sale_id"),
            DbError::UniqueViolation { constraint } if constraint == "credits.sale_id"
        ));
        assert!(matches!(
            DbError::from_sqlite_message("FOREIGN KEY constraint failed"),
            DbError::ForeignKeyViolation { .. }
        ));
        assert!(matches!(
            DbError::from_sqlite_message("credit_payments is append-only"),
            DbError::ConstraintViolation(_)
        ));
        assert!(matches!(
            DbError::from_sqlite_message("no such table: credits"),
            DbError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_validation_wraps_as_core() {
        let err: DbError = ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
