//! # Credit Ledger
//!
//! Pure functions that turn stored credits and payments into balances,
//! customer summaries, and payment plans.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  credits[] + payments[]                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build_statements() ── remaining = owed − Σ paid, status, overdue      │
//! │       │                                                                 │
//! │       ├──► summarize_by_customer() ── outstanding customers only       │
//! │       │                                                                 │
//! │       ├──► total_outstanding() ────── Σ max(remaining, 0)              │
//! │       │                                                                 │
//! │       └──► open_balance() ──┬──► plan_single_payment(amount)           │
//! │                             └──► allocate_payment(amount) oldest first │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                              Vec<Allocation> (written by tally-db)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is cached. Every read recomputes from the payment rows, so
//! there is exactly one source of truth for a balance.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    Credit, CreditPayment, CreditStatement, CreditStatus, CustomerCreditSummary, CustomerKey, Page,
    PageRequest, Pagination,
};
use crate::validation::validate_payment_amount;

// =============================================================================
// Balances
// =============================================================================

/// Remaining balance of one credit: `amount_owed − Σ amount_paid`.
///
/// Not clamped. A credit overpaid by historical data reports a negative
/// remaining balance.
///
/// ## Example
/// ```rust
/// use tally_core::ledger::compute_remaining;
/// # use tally_core::{Credit, CreditPayment, CreditType};
/// # use chrono::Utc;
/// # let credit = Credit {
/// #     id: "c-1".into(), customer_id: None, customer_name: "Asha".into(),
/// #     amount_owed_cents: 30_000, due_date: None, description: None,
/// #     credit_type: CreditType::GeneralCredit, sale_id: None, created_at: Utc::now(),
/// # };
/// # let paid = CreditPayment {
/// #     id: "p-1".into(), credit_id: "c-1".into(), amount_paid_cents: 10_000, paid_at: Utc::now(),
/// # };
/// // owed 300.00, one payment of 100.00
/// assert_eq!(compute_remaining(&credit, &[paid]).cents(), 20_000);
/// ```
pub fn compute_remaining(credit: &Credit, payments: &[CreditPayment]) -> Money {
    credit.amount_owed() - total_paid(payments)
}

/// Sum of the given payments.
pub fn total_paid(payments: &[CreditPayment]) -> Money {
    payments.iter().map(CreditPayment::amount).sum()
}

/// The credit status transition function.
///
/// ## Rules
/// ```text
/// remaining <= 0        → Paid
/// nothing paid yet      → Pending
/// otherwise             → PartiallyPaid
/// ```
pub fn credit_status(owed: Money, paid: Money) -> CreditStatus {
    let remaining = owed - paid;
    if !remaining.is_positive() {
        CreditStatus::Paid
    } else if !paid.is_positive() {
        CreditStatus::Pending
    } else {
        CreditStatus::PartiallyPaid
    }
}

/// A credit is overdue while it still has a balance after its due date.
pub fn is_overdue(due_date: Option<NaiveDate>, remaining: Money, today: NaiveDate) -> bool {
    match due_date {
        Some(due) => remaining.is_positive() && due < today,
        None => false,
    }
}

/// Due date for a credit sale opened on `opened` when none was given.
///
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::ledger::default_due_date;
///
/// let opened = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// assert_eq!(default_due_date(opened, 30), NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
/// ```
pub fn default_due_date(opened: NaiveDate, term_days: i64) -> NaiveDate {
    opened + Duration::days(term_days)
}

impl CreditStatement {
    /// Derives balance, status and overdue flag for one credit.
    ///
    /// `payments` must all belong to `credit`; they are reordered oldest
    /// first.
    pub fn new(credit: Credit, mut payments: Vec<CreditPayment>, today: NaiveDate) -> Self {
        payments.sort_by(|a, b| a.paid_at.cmp(&b.paid_at).then_with(|| a.id.cmp(&b.id)));

        let paid = total_paid(&payments);
        let remaining = credit.amount_owed() - paid;
        let status = credit_status(credit.amount_owed(), paid);
        let overdue = is_overdue(credit.due_date, remaining, today);

        CreditStatement {
            credit,
            amount_paid_cents: paid.cents(),
            remaining_cents: remaining.cents(),
            status,
            overdue,
            payments,
        }
    }

    /// The allocator's view of this credit.
    pub fn open_balance(&self) -> OpenBalance {
        OpenBalance {
            credit_id: self.credit.id.clone(),
            created_at: self.credit.created_at,
            remaining: self.remaining(),
        }
    }
}

/// Attaches each credit's payments and derives its statement.
///
/// Credit order is preserved. Payments whose credit is not in `credits`
/// are ignored.
pub fn build_statements(
    credits: Vec<Credit>,
    payments: Vec<CreditPayment>,
    today: NaiveDate,
) -> Vec<CreditStatement> {
    let mut by_credit: HashMap<String, Vec<CreditPayment>> = HashMap::new();
    for payment in payments {
        by_credit
            .entry(payment.credit_id.clone())
            .or_default()
            .push(payment);
    }

    credits
        .into_iter()
        .map(|credit| {
            let payments = by_credit.remove(&credit.id).unwrap_or_default();
            CreditStatement::new(credit, payments, today)
        })
        .collect()
}

// =============================================================================
// Customer Summaries
// =============================================================================

/// Groups statements by customer and keeps customers who still owe money.
///
/// ## Guarantees
/// - `summary.remaining == Σ statement.remaining` for the customer's credits
/// - Customers with `remaining <= 0` are excluded
/// - Output is sorted by customer name, then key (stable for pagination)
/// - Each summary lists its credits newest first
///
/// The displayed name and id come from the customer's newest credit.
pub fn summarize_by_customer(statements: Vec<CreditStatement>) -> Vec<CustomerCreditSummary> {
    let mut groups: HashMap<CustomerKey, Vec<CreditStatement>> = HashMap::new();
    for statement in statements {
        groups
            .entry(statement.credit.customer_key())
            .or_default()
            .push(statement);
    }

    let mut summaries: Vec<CustomerCreditSummary> = groups
        .into_iter()
        .filter_map(|(customer_key, mut credits)| {
            credits.sort_by(|a, b| {
                b.credit
                    .created_at
                    .cmp(&a.credit.created_at)
                    .then_with(|| b.credit.id.cmp(&a.credit.id))
            });

            let total_owed: Money = credits.iter().map(|s| s.credit.amount_owed()).sum();
            let total_paid: Money = credits.iter().map(CreditStatement::amount_paid).sum();
            let remaining: Money = credits.iter().map(CreditStatement::remaining).sum();

            if !remaining.is_positive() {
                return None;
            }

            let newest = credits.first()?;
            let customer_name = newest.credit.customer_name.clone();
            let customer_id = newest.credit.customer_id.clone();

            Some(CustomerCreditSummary {
                customer_key,
                customer_id,
                customer_name,
                total_owed_cents: total_owed.cents(),
                total_paid_cents: total_paid.cents(),
                remaining_cents: remaining.cents(),
                credit_count: credits.len(),
                overdue: credits.iter().any(|s| s.overdue),
                credits,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        a.customer_name
            .cmp(&b.customer_name)
            .then_with(|| a.customer_key.cmp(&b.customer_key))
    });
    summaries
}

/// Store-wide outstanding balance.
///
/// Only positive per-credit balances count: an overpaid credit does not
/// reduce what other credits still owe.
pub fn total_outstanding(statements: &[CreditStatement]) -> Money {
    statements
        .iter()
        .map(|s| s.remaining().clamp_non_negative())
        .sum()
}

// =============================================================================
// Listing
// =============================================================================

/// Keeps customers whose name contains `term`, ignoring case.
///
/// A blank term keeps everyone. Runs after [`summarize_by_customer`], so
/// settled customers are already gone.
pub fn search_customers(
    summaries: Vec<CustomerCreditSummary>,
    term: Option<&str>,
) -> Vec<CustomerCreditSummary> {
    let needle = match term.map(str::trim) {
        None | Some("") => return summaries,
        Some(term) => term.to_lowercase(),
    };

    summaries
        .into_iter()
        .filter(|s| s.customer_name.to_lowercase().contains(&needle))
        .collect()
}

/// Cuts one page out of an already sorted listing.
///
/// A page past the end is empty but still reports the real totals.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let limit = request.limit.max(1) as usize;
    let total_pages = total.div_ceil(limit).max(1);

    let data = items
        .into_iter()
        .skip(request.offset())
        .take(limit)
        .collect();

    Page {
        data,
        pagination: Pagination {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        },
    }
}

// =============================================================================
// Payment Planning
// =============================================================================

/// A credit as the allocator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBalance {
    pub credit_id: String,
    pub created_at: DateTime<Utc>,
    pub remaining: Money,
}

/// Part of a payment applied to one credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub credit_id: String,
    pub amount: Money,
    pub remaining_after: Money,
}

/// Splits one payment across a customer's credits, oldest first.
///
/// ## Algorithm
/// ```text
/// credits sorted by (created_at, id), only remaining > 0
///      │
///      ▼
/// for each credit while money is left:
///     applied = min(left, credit.remaining)
///     left   -= applied
/// ```
///
/// ## Errors
/// - amount <= 0 → `CoreError::Validation`
/// - amount > Σ outstanding → `CoreError::PaymentExceedsOutstanding`
///
/// On success the allocations sum to exactly `amount` and no credit ends
/// below zero. There is no partial plan: either everything fits or nothing
/// is returned.
pub fn allocate_payment(amount: Money, credits: &[OpenBalance]) -> CoreResult<Vec<Allocation>> {
    validate_payment_amount(amount.cents())?;

    let mut open: Vec<&OpenBalance> = credits
        .iter()
        .filter(|c| c.remaining.is_positive())
        .collect();

    let outstanding: Money = open.iter().map(|c| c.remaining).sum();
    if amount > outstanding {
        return Err(CoreError::PaymentExceedsOutstanding {
            requested: amount,
            outstanding,
        });
    }

    open.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.credit_id.cmp(&b.credit_id))
    });

    let mut left = amount;
    let mut plan = Vec::new();
    for credit in open {
        if left.is_zero() {
            break;
        }
        let applied = left.min(credit.remaining);
        left -= applied;
        plan.push(Allocation {
            credit_id: credit.credit_id.clone(),
            amount: applied,
            remaining_after: credit.remaining - applied,
        });
    }

    debug_assert!(left.is_zero());
    Ok(plan)
}

/// Validates a payment against exactly one credit.
///
/// ## Errors
/// - amount <= 0 → `CoreError::Validation`
/// - credit has nothing left to pay → `CoreError::CreditAlreadySettled`
/// - amount > remaining → `CoreError::PaymentExceedsRemaining`
pub fn plan_single_payment(credit: &OpenBalance, amount: Money) -> CoreResult<Allocation> {
    validate_payment_amount(amount.cents())?;

    if !credit.remaining.is_positive() {
        return Err(CoreError::CreditAlreadySettled(credit.credit_id.clone()));
    }

    if amount > credit.remaining {
        return Err(CoreError::PaymentExceedsRemaining {
            credit_id: credit.credit_id.clone(),
            requested: amount,
            remaining: credit.remaining,
        });
    }

    Ok(Allocation {
        credit_id: credit.credit_id.clone(),
        amount,
        remaining_after: credit.remaining - amount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
