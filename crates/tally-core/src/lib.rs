//! # tally-core: Pure Credit Ledger Logic
//!
//! This crate holds the business rules of the Tally store credit ledger as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React SPA)                         │   │
//! │  │    Credits page ──► Pay modal ──► Bulk pay modal                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-api (axum handlers)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │  Credit   │  │   Money   │  │ balances  │  │   rules   │  │   │
//! │  │   │  Payment  │  │  parsing  │  │ allocator │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, transactional payments       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Credit, CreditPayment, Sale, summaries)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Remaining balances, customer summaries, payment allocation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::ledger::{allocate_payment, OpenBalance};
//! use tally_core::Money;
//! use chrono::{TimeZone, Utc};
//!
//! let older = OpenBalance {
//!     credit_id: "a".to_string(),
//!     created_at: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
//!     remaining: Money::from_cents(10_000),
//! };
//! let newer = OpenBalance {
//!     credit_id: "b".to_string(),
//!     created_at: Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap(),
//!     remaining: Money::from_cents(5_000),
//! };
//!
//! // Oldest credit is settled first, the rest spills into the next one
//! let plan = allocate_payment(Money::from_cents(12_000), &[newer, older]).unwrap();
//! assert_eq!(plan[0].credit_id, "a");
//! assert_eq!(plan[0].amount.cents(), 10_000);
//! assert_eq!(plan[1].amount.cents(), 2_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Days until a credit sale falls due when the cashier gives no due date.
pub const DEFAULT_CREDIT_TERM_DAYS: i64 = 30;

/// Upper bound for a configured credit term.
pub const MAX_CREDIT_TERM_DAYS: i64 = 365;

/// Largest single amount the ledger accepts, in cents (1,000,000,000.00).
///
/// Keeps every customer and store total far inside `i64`, so balance sums
/// cannot overflow.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Rows per page when a listing request names no limit.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a listing will return.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Maximum line items on a single credit sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
