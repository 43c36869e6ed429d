//! Request and response bodies that only exist at the HTTP edge.
//!
//! Ledger types (statements, summaries, receipts) are serialized as they
//! come out of `tally-core`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_core::{CreditStatus, CreditType, Money, PageRequest, ValidationError};
use tally_db::{CreditFilter, NewCredit, NewSaleItem};

// =============================================================================
// Requests
// =============================================================================

/// `POST /api/credits`
///
/// The amount owed is given once, as integer `amount_owed_cents` or as
/// decimal text in `amount_owed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreditRequest {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub amount_owed_cents: Option<i64>,
    pub amount_owed: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl TryFrom<CreateCreditRequest> for NewCredit {
    type Error = ValidationError;

    fn try_from(req: CreateCreditRequest) -> Result<Self, Self::Error> {
        let amount_owed = either_amount(
            "amount_owed",
            req.amount_owed_cents,
            req.amount_owed.as_deref(),
        )?;

        Ok(NewCredit {
            customer_id: req.customer_id,
            customer_name: req.customer_name,
            amount_owed,
            due_date: req.due_date,
            description: req.description,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemRequest {
    pub name: String,
    #[serde(default = "default_unit_type")]
    pub unit_type: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

fn default_unit_type() -> String {
    "pcs".to_string()
}

impl From<SaleItemRequest> for NewSaleItem {
    fn from(req: SaleItemRequest) -> Self {
        NewSaleItem {
            name: req.name,
            unit_type: req.unit_type,
            unit_price: Money::from_cents(req.unit_price_cents),
            quantity: req.quantity,
        }
    }
}

/// `POST /api/sales/credit`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCreditSaleRequest {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub items: Vec<SaleItemRequest>,
    /// Defaults to today plus the configured credit term.
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Body of both payment endpoints.
///
/// Exactly one of `amount_cents` (integer) or `amount` (decimal text such
/// as `"12.50"`) must be given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
    pub amount_cents: Option<i64>,
    pub amount: Option<String>,
}

impl PaymentRequest {
    pub fn amount(&self) -> Result<Money, ValidationError> {
        either_amount("amount", self.amount_cents, self.amount.as_deref())
    }
}

/// Reads an amount sent either as integer cents or as decimal text.
fn either_amount(
    field: &str,
    cents: Option<i64>,
    text: Option<&str>,
) -> Result<Money, ValidationError> {
    match (cents, text) {
        (Some(cents), None) => Ok(Money::from_cents(cents)),
        (None, Some(text)) => Money::parse_decimal(text),
        (None, None) => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        (Some(_), Some(_)) => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("give {field} or {field}_cents, not both"),
        }),
    }
}

// =============================================================================
// Query Strings
// =============================================================================

/// `GET /api/credits?type=&status=&overdue=&search=&page=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditListQuery {
    #[serde(rename = "type")]
    pub credit_type: Option<CreditType>,
    pub status: Option<CreditStatus>,
    pub overdue: Option<bool>,
    /// Case-insensitive part of a customer name.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CreditListQuery {
    pub fn filter(&self) -> CreditFilter {
        CreditFilter {
            credit_type: self.credit_type,
            status: self.status,
            overdue_only: self.overdue.unwrap_or(false),
        }
    }

    pub fn page_request(&self) -> Result<PageRequest, ValidationError> {
        PageRequest::new(self.page, self.limit)
    }
}

/// `GET /api/credits/customer/:key?type=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerQuery {
    #[serde(rename = "type")]
    pub credit_type: Option<CreditType>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalOutstandingResponse {
    pub total_outstanding_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
}
