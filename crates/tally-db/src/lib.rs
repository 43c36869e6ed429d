//! # tally-db: Database Layer for Tally
//!
//! SQLite storage for the credit ledger, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/credits/pay/:id)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (credit.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │ (sale.rs)     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│               │    │ 001_init.sql │  │   │
//! │  │   │ KeyedLocks    │    │  ledger rules │    │              │  │   │
//! │  │   └───────────────┘    │  from core    │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`locks`] - Per-customer write serialization
//! - [`error`] - Database error types
//! - [`repository`] - Credit and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_core::Money;
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let receipt = db.credits().pay_credit(&credit_id, Money::from_cents(2_000)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use locks::KeyedLocks;
pub use pool::{Database, DbConfig, Storage};

pub use repository::credit::{CreditFilter, CreditRepository, NewCredit};
pub use repository::sale::{NewCreditSale, NewSaleItem, SaleRepository};
