//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  HTTP errors (in tally-api)                                            │
//! │  └── ApiError         - What the client sees ({code, message})         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger business rule errors.
///
/// A payment that fails any of these checks is rejected as a whole: no
/// payment rows are written.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payment against a single credit is larger than what is still owed.
    ///
    /// ## When This Occurs
    /// ```text
    /// Credit: owed 300.00, paid 100.00 → remaining 200.00
    ///      │
    ///      ▼
    /// Pay 250.00
    ///      │
    ///      ▼
    /// PaymentExceedsRemaining { requested: 250.00, remaining: 200.00 }
    /// ```
    #[error("Payment {requested} exceeds remaining balance {remaining} on credit {credit_id}")]
    PaymentExceedsRemaining {
        credit_id: String,
        requested: Money,
        remaining: Money,
    },

    /// Bulk payment is larger than the customer's total outstanding balance.
    ///
    /// ## When This Occurs
    /// - Customer owes 150.00 across all open credits, cashier enters 200.00
    /// - Customer has nothing outstanding at all (outstanding is 0.00)
    #[error("Payment {requested} exceeds total outstanding balance {outstanding}")]
    PaymentExceedsOutstanding { requested: Money, outstanding: Money },

    /// Credit is already fully paid.
    #[error("Credit {0} is already settled")]
    CreditAlreadySettled(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for errors that reject a payment on ledger grounds, as opposed
    /// to malformed input or a missing record.
    pub fn is_payment_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::PaymentExceedsRemaining { .. }
                | CoreError::PaymentExceedsOutstanding { .. }
                | CoreError::CreditAlreadySettled(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before ledger logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
