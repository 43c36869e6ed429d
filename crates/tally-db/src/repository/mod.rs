//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.credits().pay_customer(&key, amount)                       │
//! │       ▼                                                                 │
//! │  CreditRepository                                                      │
//! │  ├── lock customer key                                                 │
//! │  ├── BEGIN IMMEDIATE                                                   │
//! │  ├── load credits + payments  ──► tally_core::ledger (pure rules)      │
//! │  ├── insert payments, complete settled sales                           │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL lives here; balances and allocation rules live in tally-core.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`credit::CreditRepository`] - Credits, statements and payments
//! - [`sale::SaleRepository`] - Deferred-payment sales and their items

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod credit;
pub mod sale;

/// Opens a transaction that holds SQLite's write lock from the start.
///
/// A plain `BEGIN` only asks for the lock at the first write. If another
/// connection commits in between, SQLite refuses the upgrade with
/// `SQLITE_BUSY` and the busy timeout does not retry it. Taking the lock up
/// front makes concurrent writers queue on the busy timeout instead.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
