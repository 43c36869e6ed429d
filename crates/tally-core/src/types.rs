//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │     Credit      │   │ CreditPayment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  sale_id (opt)  │◄──│  credit_id (FK) │       │
//! │  │  status         │   │  customer       │   │  amount_paid    │       │
//! │  │  payment_method │   │  amount_owed    │   │  paid_at        │       │
//! │  │  total_cents    │   │  due_date (opt) │   │  (append-only)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Derived on every read (never stored):                                 │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌───────────────┐    │
//! │  │ CreditStatement │──►│ CustomerCreditSummary│   │ CreditStatus  │    │
//! │  │ paid, remaining │   │ totals per customer  │   │ Pending       │    │
//! │  │ status, overdue │   │                      │   │ PartiallyPaid │    │
//! │  └─────────────────┘   └──────────────────────┘   │ Paid          │    │
//! │                                                   └───────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::validation::{validate_page, validate_page_limit, ValidationResult};
use crate::DEFAULT_PAGE_LIMIT;

// =============================================================================
// Credit Type
// =============================================================================

/// How a credit came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    /// Created together with a deferred-payment sale.
    SaleCredit,
    /// Created directly by staff for a walk-in tab.
    GeneralCredit,
}

impl CreditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::SaleCredit => "sale_credit",
            CreditType::GeneralCredit => "general_credit",
        }
    }
}

// =============================================================================
// Credit Status
// =============================================================================

/// Settlement status of a credit.
///
/// Derived solely from the remaining balance by
/// [`credit_status`](crate::ledger::credit_status); there is no stored copy.
///
/// ```text
///            payment, remaining > 0
///  Pending ───────────────────────► PartiallyPaid ──┐ payment,
///     │                                  ▲   │      │ remaining > 0
///     │ payment, remaining == 0          └───┼──────┘
///     ▼                                      │ payment, remaining == 0
///   Paid ◄───────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// Nothing paid yet.
    Pending,
    /// Some payments recorded, balance still open.
    PartiallyPaid,
    /// Remaining balance is zero (or below, for legacy overpaid rows).
    Paid,
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreditStatus::Pending => "pending",
            CreditStatus::PartiallyPaid => "partially_paid",
            CreditStatus::Paid => "paid",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Credit
// =============================================================================

/// Money a customer owes the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Credit {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Registered customer, when the credit belongs to one.
    pub customer_id: Option<String>,

    /// Customer name as entered at the till (trimmed).
    pub customer_name: String,

    /// Amount owed in cents. Always positive.
    pub amount_owed_cents: i64,

    /// Date the balance should be settled by.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    pub description: Option<String>,

    #[serde(rename = "type")]
    pub credit_type: CreditType,

    /// Sale this credit defers payment for (sale credits only).
    pub sale_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Credit {
    /// Returns the amount owed as Money.
    #[inline]
    pub fn amount_owed(&self) -> Money {
        Money::from_cents(self.amount_owed_cents)
    }

    /// Returns the key this credit is grouped under.
    #[inline]
    pub fn customer_key(&self) -> CustomerKey {
        CustomerKey::for_credit(self)
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// Money applied against one credit. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditPayment {
    pub id: String,
    pub credit_id: String,
    /// Amount paid in cents. Always positive.
    pub amount_paid_cents: i64,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

impl CreditPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }
}

// =============================================================================
// Customer Key
// =============================================================================

/// Identity credits are grouped by.
///
/// ## Resolution
/// ```text
/// customer_id present?  ── yes ──► key = customer_id
///        │
///        no
///        ▼
/// key = customer_name
/// ```
///
/// Two walk-in tabs under the same name therefore share a key, while
/// registered customers never merge with each other even if their names
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerKey(String);

impl CustomerKey {
    pub fn for_credit(credit: &Credit) -> Self {
        match credit.customer_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => CustomerKey(id.to_string()),
            _ => CustomerKey(credit.customer_name.trim().to_string()),
        }
    }

    /// Wraps a key received from a client (path segment).
    pub fn from_raw(key: impl Into<String>) -> Self {
        CustomerKey(key.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Derived Views
// =============================================================================

/// A credit together with its payments and derived balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditStatement {
    #[serde(flatten)]
    pub credit: Credit,
    pub amount_paid_cents: i64,
    /// Unclamped: negative for a credit that was overpaid historically.
    pub remaining_cents: i64,
    pub status: CreditStatus,
    /// Balance still open and due date already passed.
    pub overdue: bool,
    /// Oldest first.
    pub payments: Vec<CreditPayment>,
}

impl CreditStatement {
    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }
}

/// All of one customer's credits, rolled up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerCreditSummary {
    /// Value accepted by the per-customer endpoints.
    pub customer_key: CustomerKey,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub total_owed_cents: i64,
    pub total_paid_cents: i64,
    /// Sum of the per-credit remaining balances.
    pub remaining_cents: i64,
    pub credit_count: usize,
    /// At least one credit is overdue.
    pub overdue: bool,
    /// Newest first.
    pub credits: Vec<CreditStatement>,
}

// =============================================================================
// Paging
// =============================================================================

/// Which slice of a listing to return. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Fills in defaults and rejects page 0 or a limit outside
    /// `1..=MAX_PAGE_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> ValidationResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        validate_page(page)?;
        validate_page_limit(limit)?;
        Ok(PageRequest { page, limit })
    }

    /// Rows to skip before this page starts.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Rows across all pages.
    pub total: usize,
    /// At least 1, even for an empty listing.
    pub total_pages: u32,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

// =============================================================================
// Payment Results
// =============================================================================

/// One payment row written by a single or bulk payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedPayment {
    #[serde(flatten)]
    pub payment: CreditPayment,
    pub remaining_after_cents: i64,
    pub status_after: CreditStatus,
    /// Linked sale that was marked completed because this payment settled it.
    pub completed_sale_id: Option<String>,
}

/// What a caller gets back after a payment was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentReceipt {
    pub customer_key: CustomerKey,
    /// Equal to the requested amount.
    pub amount_applied_cents: i64,
    /// In application order (oldest credit first).
    pub payments: Vec<AppliedPayment>,
    /// Customer's outstanding balance after this payment.
    pub remaining_outstanding_cents: i64,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Goods handed over, payment deferred to a credit.
    Pending,
    /// Fully paid.
    Completed,
    /// Cancelled.
    Voided,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Paid later through the credit ledger.
    Credit,
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Selling unit, e.g. "pcs", "kg", "bunch".
    pub unit_type: String,
    /// Price per unit in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Whole units of `unit_type` sold.
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A sale with its lines and, for deferred-payment sales, its credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub credit: Option<Credit>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credit(customer_id: Option<&str>, name: &str) -> Credit {
        Credit {
            id: "c-1".to_string(),
            customer_id: customer_id.map(str::to_string),
            customer_name: name.to_string(),
            amount_owed_cents: 1000,
            due_date: None,
            description: None,
            credit_type: CreditType::GeneralCredit,
            sale_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_customer_key_prefers_id() {
        let key = credit(Some("cust-42"), "Asha").customer_key();
        assert_eq!(key.as_str(), "cust-42");
    }

    #[test]
    fn test_customer_key_falls_back_to_name() {
        assert_eq!(credit(None, " Asha ").customer_key().as_str(), "Asha");
        assert_eq!(credit(Some("  "), "Asha").customer_key().as_str(), "Asha");
    }

    #[test]
    fn test_credit_serializes_type_field() {
        let json = serde_json::to_value(credit(None, "Asha")).unwrap();
        assert_eq!(json["type"], "general_credit");
        assert!(json.get("credit_type").is_none());
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in [
            CreditStatus::Pending,
            CreditStatus::PartiallyPaid,
            CreditStatus::Paid,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }
}
