//! # Credit Repository
//!
//! Credits, their statements, and the two ways of paying them.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 pay_credit / pay_customer                               │
//! │                                                                         │
//! │  validate amount > 0                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  locks.lock(customer_key) ── one writer per customer                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── load the customer's credits + payments                           │
//! │   ├── ledger::plan_single_payment / ledger::allocate_payment           │
//! │   │        └── rejected? → ROLLBACK, nothing written                   │
//! │   ├── INSERT credit_payments (one row per credit touched)              │
//! │   └── credit settled + linked sale pending → sale completed            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Balances are never stored. Every read re-derives them from
//! `credit_payments` through `tally_core::ledger`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::locks::KeyedLocks;
use crate::repository::begin_write;
use crate::repository::sale::mark_completed;
use tally_core::ledger::{
    allocate_payment, build_statements, credit_status, paginate, plan_single_payment,
    search_customers, summarize_by_customer, total_outstanding, Allocation,
};
use tally_core::validation::{
    validate_amount_owed, validate_customer_id, validate_customer_name, validate_description,
    validate_payment_amount,
};
use tally_core::{
    AppliedPayment, Credit, CreditPayment, CreditStatement, CreditStatus, CreditType,
    CustomerCreditSummary, CustomerKey, Money, Page, PageRequest, PaymentReceipt,
};

// =============================================================================
// SQL
// =============================================================================

const SELECT_CREDIT: &str = r#"
    SELECT
        id, customer_id, customer_name, amount_owed_cents, due_date,
        description, credit_type, sale_id, created_at
    FROM credits
    WHERE id = ?1
"#;

const SELECT_CREDITS: &str = r#"
    SELECT
        id, customer_id, customer_name, amount_owed_cents, due_date,
        description, credit_type, sale_id, created_at
    FROM credits
    WHERE (?1 IS NULL OR credit_type = ?1)
    ORDER BY created_at DESC, id DESC
"#;

const SELECT_PAYMENTS: &str = r#"
    SELECT p.id, p.credit_id, p.amount_paid_cents, p.paid_at
    FROM credit_payments p
    JOIN credits c ON c.id = p.credit_id
    WHERE (?1 IS NULL OR c.credit_type = ?1)
"#;

const SELECT_CUSTOMER_CREDITS: &str = r#"
    SELECT
        id, customer_id, customer_name, amount_owed_cents, due_date,
        description, credit_type, sale_id, created_at
    FROM credits
    WHERE (customer_id = ?1 OR (customer_id IS NULL AND customer_name = ?1))
      AND (?2 IS NULL OR credit_type = ?2)
    ORDER BY created_at DESC, id DESC
"#;

const SELECT_CUSTOMER_PAYMENTS: &str = r#"
    SELECT p.id, p.credit_id, p.amount_paid_cents, p.paid_at
    FROM credit_payments p
    JOIN credits c ON c.id = p.credit_id
    WHERE (c.customer_id = ?1 OR (c.customer_id IS NULL AND c.customer_name = ?1))
      AND (?2 IS NULL OR c.credit_type = ?2)
"#;

const SELECT_CREDIT_PAYMENTS: &str = r#"
    SELECT id, credit_id, amount_paid_cents, paid_at
    FROM credit_payments
    WHERE credit_id = ?1
"#;

const INSERT_CREDIT: &str = r#"
    INSERT INTO credits (
        id, customer_id, customer_name, amount_owed_cents, due_date,
        description, credit_type, sale_id, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

const INSERT_PAYMENT: &str = r#"
    INSERT INTO credit_payments (id, credit_id, amount_paid_cents, paid_at)
    VALUES (?1, ?2, ?3, ?4)
"#;

// =============================================================================
// Drafts and Filters
// =============================================================================

/// A tab opened by staff without a sale behind it.
#[derive(Debug, Clone)]
pub struct NewCredit {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub amount_owed: Money,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Narrows statement listings.
///
/// `credit_type` is applied in SQL; `status` and `overdue_only` depend on
/// derived balances and are applied after the ledger runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreditFilter {
    pub credit_type: Option<CreditType>,
    pub status: Option<CreditStatus>,
    pub overdue_only: bool,
}

impl CreditFilter {
    fn matches(&self, statement: &CreditStatement) -> bool {
        self.status.map_or(true, |status| statement.status == status)
            && (!self.overdue_only || statement.overdue)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for credits and credit payments.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
    locks: Arc<KeyedLocks>,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    ///
    /// Every repository that writes payments must share the same `locks`.
    pub fn new(pool: SqlitePool, locks: Arc<KeyedLocks>) -> Self {
        CreditRepository { pool, locks }
    }

    /// Opens a general credit (a walk-in tab).
    pub async fn create_general_credit(&self, draft: NewCredit) -> DbResult<Credit> {
        let customer_name = validate_customer_name(&draft.customer_name)?;
        let customer_id = validate_customer_id(draft.customer_id.as_deref())?;
        let description = validate_description(draft.description.as_deref())?;
        validate_amount_owed(draft.amount_owed.cents())?;

        let credit = Credit {
            id: Uuid::new_v4().to_string(),
            customer_id,
            customer_name,
            amount_owed_cents: draft.amount_owed.cents(),
            due_date: draft.due_date,
            description,
            credit_type: CreditType::GeneralCredit,
            sale_id: None,
            created_at: Utc::now(),
        };

        insert_credit(&self.pool, &credit).await?;

        info!(
            credit_id = %credit.id,
            customer = %credit.customer_key(),
            amount = %credit.amount_owed(),
            "General credit opened"
        );

        Ok(credit)
    }

    /// Gets a credit by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Credit>> {
        let credit = sqlx::query_as::<_, Credit>(SELECT_CREDIT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credit)
    }

    /// One credit with its payments and derived balance.
    pub async fn statement(&self, id: &str) -> DbResult<CreditStatement> {
        let mut tx = self.pool.begin().await?;

        let credit = sqlx::query_as::<_, Credit>(SELECT_CREDIT)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Credit", id))?;

        let payments = sqlx::query_as::<_, CreditPayment>(SELECT_CREDIT_PAYMENTS)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CreditStatement::new(credit, payments, today()))
    }

    /// Statements for every credit matching `filter`, newest first.
    pub async fn statements(&self, filter: &CreditFilter) -> DbResult<Vec<CreditStatement>> {
        debug!(?filter, "Loading credit statements");

        // Credits and payments must come from the same snapshot.
        let mut tx = self.pool.begin().await?;

        let credits = sqlx::query_as::<_, Credit>(SELECT_CREDITS)
            .bind(filter.credit_type)
            .fetch_all(&mut *tx)
            .await?;

        let payments = sqlx::query_as::<_, CreditPayment>(SELECT_PAYMENTS)
            .bind(filter.credit_type)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut statements = build_statements(credits, payments, today());
        statements.retain(|s| filter.matches(s));
        Ok(statements)
    }

    /// Customers who still owe money, among the credits matching `filter`.
    pub async fn outstanding_customers(
        &self,
        filter: &CreditFilter,
    ) -> DbResult<Vec<CustomerCreditSummary>> {
        let statements = self.statements(filter).await?;
        Ok(summarize_by_customer(statements))
    }

    /// One page of [`outstanding_customers`](Self::outstanding_customers),
    /// narrowed to names containing `search`.
    ///
    /// Settled customers are dropped before searching and paging, so page
    /// counts only cover customers who still owe.
    pub async fn outstanding_page(
        &self,
        filter: &CreditFilter,
        search: Option<&str>,
        page: PageRequest,
    ) -> DbResult<Page<CustomerCreditSummary>> {
        let summaries = self.outstanding_customers(filter).await?;
        Ok(paginate(search_customers(summaries, search), page))
    }

    /// All of one customer's credits, newest first.
    ///
    /// An unknown customer simply has no statements.
    pub async fn customer_statements(
        &self,
        key: &CustomerKey,
        credit_type: Option<CreditType>,
    ) -> DbResult<Vec<CreditStatement>> {
        debug!(customer = %key, "Loading customer statements");

        let mut tx = self.pool.begin().await?;
        let statements = load_customer_ledger(&mut tx, key, credit_type, today()).await?;
        tx.commit().await?;

        Ok(statements)
    }

    /// Store-wide outstanding balance.
    pub async fn total_outstanding(&self) -> DbResult<Money> {
        let statements = self.statements(&CreditFilter::default()).await?;
        Ok(total_outstanding(&statements))
    }

    /// Pays part or all of one credit.
    ///
    /// ## Errors
    /// - `NotFound` if the credit doesn't exist
    /// - `Core(Validation)` if `amount <= 0`
    /// - `Core(CreditAlreadySettled | PaymentExceedsRemaining)` otherwise
    ///   rejected; nothing is written
    pub async fn pay_credit(&self, credit_id: &str, amount: Money) -> DbResult<PaymentReceipt> {
        validate_payment_amount(amount.cents())?;

        let key = self
            .get_by_id(credit_id)
            .await?
            .ok_or_else(|| DbError::not_found("Credit", credit_id))?
            .customer_key();

        let _guard = self.locks.lock(key.as_str()).await;
        let mut tx = begin_write(&self.pool).await?;

        let ledger = load_customer_ledger(&mut tx, &key, None, today()).await?;
        let statement = ledger
            .iter()
            .find(|s| s.credit.id == credit_id)
            .ok_or_else(|| DbError::not_found("Credit", credit_id))?;

        let allocation = plan_single_payment(&statement.open_balance(), amount).map_err(|e| {
            warn!(credit_id, amount = %amount, error = %e, "Payment rejected");
            e
        })?;

        let payments =
            apply_allocations(&mut tx, std::slice::from_ref(&allocation), &ledger, Utc::now())
                .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let receipt = PaymentReceipt {
            customer_key: key,
            amount_applied_cents: amount.cents(),
            payments,
            remaining_outstanding_cents: (total_outstanding(&ledger) - amount).cents(),
        };

        info!(
            credit_id,
            customer = %receipt.customer_key,
            amount = %amount,
            remaining = %allocation.remaining_after,
            "Credit payment recorded"
        );

        Ok(receipt)
    }

    /// Spreads one payment over a customer's open credits, oldest first.
    ///
    /// ## Errors
    /// - `NotFound` if the customer has no credits at all
    /// - `Core(Validation)` if `amount <= 0`
    /// - `Core(PaymentExceedsOutstanding)` if `amount` is more than the
    ///   customer owes; nothing is written
    pub async fn pay_customer(&self, key: &CustomerKey, amount: Money) -> DbResult<PaymentReceipt> {
        validate_payment_amount(amount.cents())?;

        let _guard = self.locks.lock(key.as_str()).await;
        let mut tx = begin_write(&self.pool).await?;

        let ledger = load_customer_ledger(&mut tx, key, None, today()).await?;
        if ledger.is_empty() {
            return Err(DbError::not_found("Customer credits", key.as_str()));
        }

        let balances: Vec<_> = ledger.iter().map(CreditStatement::open_balance).collect();
        let plan = allocate_payment(amount, &balances).map_err(|e| {
            warn!(customer = %key, amount = %amount, error = %e, "Bulk payment rejected");
            e
        })?;

        let payments = apply_allocations(&mut tx, &plan, &ledger, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            customer = %key,
            amount = %amount,
            credits = payments.len(),
            "Bulk payment allocated"
        );

        Ok(PaymentReceipt {
            customer_key: key.clone(),
            amount_applied_cents: amount.cents(),
            payments,
            remaining_outstanding_cents: (total_outstanding(&ledger) - amount).cents(),
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) async fn insert_credit<'e, E>(executor: E, credit: &Credit) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(INSERT_CREDIT)
        .bind(&credit.id)
        .bind(&credit.customer_id)
        .bind(&credit.customer_name)
        .bind(credit.amount_owed_cents)
        .bind(credit.due_date)
        .bind(&credit.description)
        .bind(credit.credit_type)
        .bind(&credit.sale_id)
        .bind(credit.created_at)
        .execute(executor)
        .await?;

    Ok(())
}

/// Loads one customer's statements, newest first.
async fn load_customer_ledger(
    conn: &mut SqliteConnection,
    key: &CustomerKey,
    credit_type: Option<CreditType>,
    today: NaiveDate,
) -> DbResult<Vec<CreditStatement>> {
    let credits = sqlx::query_as::<_, Credit>(SELECT_CUSTOMER_CREDITS)
        .bind(key.as_str())
        .bind(credit_type)
        .fetch_all(&mut *conn)
        .await?;

    let payments = sqlx::query_as::<_, CreditPayment>(SELECT_CUSTOMER_PAYMENTS)
        .bind(key.as_str())
        .bind(credit_type)
        .fetch_all(&mut *conn)
        .await?;

    Ok(build_statements(credits, payments, today))
}

/// Writes one payment per allocation and completes any sale whose credit
/// the payment settles.
async fn apply_allocations(
    conn: &mut SqliteConnection,
    plan: &[Allocation],
    ledger: &[CreditStatement],
    now: DateTime<Utc>,
) -> DbResult<Vec<AppliedPayment>> {
    let mut applied = Vec::with_capacity(plan.len());

    for allocation in plan {
        let statement = ledger
            .iter()
            .find(|s| s.credit.id == allocation.credit_id)
            .ok_or_else(|| {
                DbError::Internal(format!("allocation for unknown credit {}", allocation.credit_id))
            })?;

        let payment = CreditPayment {
            id: Uuid::new_v4().to_string(),
            credit_id: allocation.credit_id.clone(),
            amount_paid_cents: allocation.amount.cents(),
            paid_at: now,
        };

        sqlx::query(INSERT_PAYMENT)
            .bind(&payment.id)
            .bind(&payment.credit_id)
            .bind(payment.amount_paid_cents)
            .bind(payment.paid_at)
            .execute(&mut *conn)
            .await?;

        let status_after = credit_status(
            statement.credit.amount_owed(),
            statement.amount_paid() + allocation.amount,
        );

        let mut completed_sale_id = None;
        if status_after == CreditStatus::Paid {
            if let Some(sale_id) = &statement.credit.sale_id {
                if mark_completed(&mut *conn, sale_id, now).await? {
                    debug!(sale_id = %sale_id, "Linked sale completed");
                    completed_sale_id = Some(sale_id.clone());
                }
            }
        }

        applied.push(AppliedPayment {
            payment,
            remaining_after_cents: allocation.remaining_after.cents(),
            status_after,
            completed_sale_id,
        });
    }

    Ok(applied)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::{NewCreditSale, NewSaleItem};
    use chrono::TimeZone;
    use tally_core::{CoreError, SaleStatus, ValidationError, MAX_AMOUNT_CENTS};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a general credit with a fixed creation time.
    async fn seed_credit(db: &Database, name: &str, owed: i64, minute: u32) -> Credit {
        let credit = Credit {
            id: Uuid::new_v4().to_string(),
            customer_id: None,
            customer_name: name.to_string(),
            amount_owed_cents: owed,
            due_date: None,
            description: None,
            credit_type: CreditType::GeneralCredit,
            sale_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, minute, 0).unwrap(),
        };
        insert_credit(db.pool(), &credit).await.unwrap();
        credit
    }

    async fn payment_rows(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM credit_payments")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_general_credit() {
        let db = test_db().await;

        let credit = db
            .credits()
            .create_general_credit(NewCredit {
                customer_id: None,
                customer_name: " Bilal ".to_string(),
                amount_owed: Money::from_cents(12_000),
                due_date: None,
                description: Some("  ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(credit.customer_name, "Bilal");
        assert_eq!(credit.description, None);
        assert_eq!(credit.credit_type, CreditType::GeneralCredit);

        let statement = db.credits().statement(&credit.id).await.unwrap();
        assert_eq!(statement.remaining_cents, 12_000);
        assert_eq!(statement.status, CreditStatus::Pending);
        assert!(statement.payments.is_empty());
    }

    #[tokio::test]
    async fn test_create_general_credit_rejects_zero_amount() {
        let db = test_db().await;

        let result = db
            .credits()
            .create_general_credit(NewCredit {
                customer_id: None,
                customer_name: "Bilal".to_string(),
                amount_owed: Money::zero(),
                due_date: None,
                description: None,
            })
            .await;

        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_single_payment_over_remaining_writes_nothing() {
        let db = test_db().await;
        let credit = seed_credit(&db, "Asha", 30_000, 0).await;

        db.credits()
            .pay_credit(&credit.id, Money::from_cents(10_000))
            .await
            .unwrap();

        let rejected = db
            .credits()
            .pay_credit(&credit.id, Money::from_cents(25_000))
            .await;
        assert!(matches!(
            rejected,
            Err(DbError::Core(CoreError::PaymentExceedsRemaining { .. }))
        ));
        assert_eq!(payment_rows(&db).await, 1);

        let receipt = db
            .credits()
            .pay_credit(&credit.id, Money::from_cents(20_000))
            .await
            .unwrap();
        assert_eq!(receipt.payments.len(), 1);
        assert_eq!(receipt.payments[0].remaining_after_cents, 0);
        assert_eq!(receipt.payments[0].status_after, CreditStatus::Paid);
        assert_eq!(receipt.remaining_outstanding_cents, 0);

        let settled = db
            .credits()
            .pay_credit(&credit.id, Money::from_cents(1))
            .await;
        assert!(matches!(
            settled,
            Err(DbError::Core(CoreError::CreditAlreadySettled(_)))
        ));
    }

    #[tokio::test]
    async fn test_pay_missing_credit_is_not_found() {
        let db = test_db().await;

        let result = db.credits().pay_credit("nope", Money::from_cents(100)).await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));

        let result = db
            .credits()
            .pay_customer(&CustomerKey::from_raw("Nobody"), Money::from_cents(100))
            .await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_bulk_payment_oldest_first() {
        let db = test_db().await;
        let older = seed_credit(&db, "Asha", 50_000, 0).await;
        let newer = seed_credit(&db, "Asha", 30_000, 5).await;

        let receipt = db
            .credits()
            .pay_customer(&CustomerKey::from_raw("Asha"), Money::from_cents(60_000))
            .await
            .unwrap();

        assert_eq!(receipt.amount_applied_cents, 60_000);
        assert_eq!(receipt.payments.len(), 2);
        assert_eq!(receipt.payments[0].payment.credit_id, older.id);
        assert_eq!(receipt.payments[0].payment.amount_paid_cents, 50_000);
        assert_eq!(receipt.payments[0].status_after, CreditStatus::Paid);
        assert_eq!(receipt.payments[1].payment.credit_id, newer.id);
        assert_eq!(receipt.payments[1].payment.amount_paid_cents, 10_000);
        assert_eq!(receipt.payments[1].remaining_after_cents, 20_000);
        assert_eq!(receipt.payments[1].status_after, CreditStatus::PartiallyPaid);
        assert_eq!(receipt.remaining_outstanding_cents, 20_000);

        let statement = db.credits().statement(&newer.id).await.unwrap();
        assert_eq!(statement.remaining_cents, 20_000);
    }

    #[tokio::test]
    async fn test_repeated_bulk_payment_is_rejected() {
        let db = test_db().await;
        seed_credit(&db, "Asha", 10_000, 0).await;
        seed_credit(&db, "Asha", 5_000, 1).await;
        let key = CustomerKey::from_raw("Asha");

        db.credits()
            .pay_customer(&key, Money::from_cents(15_000))
            .await
            .unwrap();
        assert_eq!(payment_rows(&db).await, 2);

        let again = db.credits().pay_customer(&key, Money::from_cents(15_000)).await;
        assert!(matches!(
            again,
            Err(DbError::Core(CoreError::PaymentExceedsOutstanding { .. }))
        ));
        assert_eq!(payment_rows(&db).await, 2);
    }

    #[tokio::test]
    async fn test_settling_sale_credit_completes_sale() {
        let db = test_db().await;
        let detail = db
            .sales()
            .create_credit_sale(NewCreditSale {
                customer_id: None,
                customer_name: "Asha".to_string(),
                items: vec![NewSaleItem {
                    name: "Flour".to_string(),
                    unit_type: "kg".to_string(),
                    unit_price: Money::from_cents(2_000),
                    quantity: 5,
                }],
                due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                description: None,
                notes: None,
            })
            .await
            .unwrap();
        let credit_id = detail.credit.unwrap().id;

        let partial = db
            .credits()
            .pay_credit(&credit_id, Money::from_cents(4_000))
            .await
            .unwrap();
        assert_eq!(partial.payments[0].completed_sale_id, None);
        let sale = db.sales().get_by_id(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);

        let rest = db
            .credits()
            .pay_credit(&credit_id, Money::from_cents(6_000))
            .await
            .unwrap();
        assert_eq!(
            rest.payments[0].completed_sale_id.as_deref(),
            Some(detail.sale.id.as_str())
        );
        let sale = db.sales().get_by_id(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_payments_never_overpay() {
        let db = test_db().await;
        let credit = seed_credit(&db, "Asha", 500, 0).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let credits = db.credits();
            let id = credit.id.clone();
            handles.push(tokio::spawn(async move {
                credits.pay_credit(&id, Money::from_cents(100)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 5);
        let statement = db.credits().statement(&credit.id).await.unwrap();
        assert_eq!(statement.amount_paid_cents, 500);
        assert_eq!(statement.remaining_cents, 0);
    }

    /// A file store with a multi-connection WAL pool, so payments really
    /// run on separate connections.
    async fn file_db() -> (Database, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("tally-pay-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();
        (db, path)
    }

    async fn remove_file_db(db: Database, path: std::path::PathBuf) {
        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_same_customer_never_overpays() {
        let (db, path) = file_db().await;
        let credit = seed_credit(&db, "Asha", 500, 0).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let credits = db.credits();
            let id = credit.id.clone();
            handles.push(tokio::spawn(async move {
                credits.pay_credit(&id, Money::from_cents(100)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DbError::Core(e)) => assert!(e.is_payment_rejection(), "{e}"),
                Err(e) => panic!("payment failed outside the ledger: {e}"),
            }
        }

        assert_eq!(accepted, 5);
        let statement = db.credits().statement(&credit.id).await.unwrap();
        assert_eq!(statement.amount_paid_cents, 500);
        assert_eq!(statement.status, CreditStatus::Paid);

        remove_file_db(db, path).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_accepts_parallel_payments_for_different_customers() {
        let (db, path) = file_db().await;

        let mut credits = Vec::new();
        for n in 0..20 {
            credits.push(seed_credit(&db, &format!("Customer {n}"), 1_000, 0).await);
        }

        for _round in 0..5 {
            let mut handles = Vec::new();
            for credit in &credits {
                let repo = db.credits();
                let id = credit.id.clone();
                handles.push(tokio::spawn(async move {
                    repo.pay_credit(&id, Money::from_cents(100)).await
                }));
            }

            for handle in handles {
                let receipt = handle.await.unwrap();
                assert!(receipt.is_ok(), "{:?}", receipt.err());
            }
        }

        assert_eq!(payment_rows(&db).await, 100);
        for credit in &credits {
            let statement = db.credits().statement(&credit.id).await.unwrap();
            assert_eq!(statement.remaining_cents, 500);
        }
        assert_eq!(db.credits().total_outstanding().await.unwrap().cents(), 10_000);

        remove_file_db(db, path).await;
    }

    #[tokio::test]
    async fn test_amounts_past_the_ceiling_are_rejected() {
        let db = test_db().await;
        let draft = |cents: i64| NewCredit {
            customer_id: None,
            customer_name: "Asha".to_string(),
            amount_owed: Money::from_cents(cents),
            due_date: None,
            description: None,
        };

        let too_big = db.credits().create_general_credit(draft(i64::MAX / 2 + 1)).await;
        assert!(matches!(
            too_big,
            Err(DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));

        db.credits()
            .create_general_credit(draft(MAX_AMOUNT_CENTS))
            .await
            .unwrap();
        db.credits()
            .create_general_credit(draft(MAX_AMOUNT_CENTS))
            .await
            .unwrap();

        let listing = db
            .credits()
            .outstanding_customers(&CreditFilter::default())
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].remaining_cents, 2 * MAX_AMOUNT_CENTS);

        let overpay = db
            .credits()
            .pay_customer(&CustomerKey::from_raw("Asha"), Money::from_cents(i64::MAX))
            .await;
        assert!(matches!(
            overpay,
            Err(DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));
        assert_eq!(payment_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn test_payments_are_append_only() {
        let db = test_db().await;
        let credit = seed_credit(&db, "Asha", 500, 0).await;
        db.credits()
            .pay_credit(&credit.id, Money::from_cents(100))
            .await
            .unwrap();

        let update = sqlx::query("UPDATE credit_payments SET amount_paid_cents = 1")
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(update, Err(DbError::ConstraintViolation(_))));

        let delete = sqlx::query("DELETE FROM credit_payments")
            .execute(db.pool())
            .await
            .map_err(DbError::from);
        assert!(matches!(delete, Err(DbError::ConstraintViolation(_))));
        assert_eq!(payment_rows(&db).await, 1);
    }

    #[tokio::test]
    async fn test_outstanding_customers_and_filters() {
        let db = test_db().await;
        let asha = seed_credit(&db, "Asha", 10_000, 0).await;
        seed_credit(&db, "Bilal", 4_000, 1).await;
        let settled = seed_credit(&db, "Carol", 2_000, 2).await;

        db.credits()
            .pay_credit(&settled.id, Money::from_cents(2_000))
            .await
            .unwrap();
        db.credits()
            .pay_credit(&asha.id, Money::from_cents(2_500))
            .await
            .unwrap();

        let summaries = db
            .credits()
            .outstanding_customers(&CreditFilter::default())
            .await
            .unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Bilal"]);
        assert_eq!(summaries[0].remaining_cents, 7_500);
        assert_eq!(summaries[0].total_paid_cents, 2_500);

        let partial = db
            .credits()
            .statements(&CreditFilter {
                status: Some(CreditStatus::PartiallyPaid),
                ..CreditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].credit.id, asha.id);

        let sale_credits = db
            .credits()
            .statements(&CreditFilter {
                credit_type: Some(CreditType::SaleCredit),
                ..CreditFilter::default()
            })
            .await
            .unwrap();
        assert!(sale_credits.is_empty());

        let total = db.credits().total_outstanding().await.unwrap();
        assert_eq!(total.cents(), 11_500);
    }

    #[tokio::test]
    async fn test_outstanding_page_searches_then_pages() {
        let db = test_db().await;
        for (minute, name) in ["Asha", "Bilal", "Carol", "Dana", "Sasha"].iter().enumerate() {
            seed_credit(&db, name, 1_000, minute as u32).await;
        }
        let sasha = db
            .credits()
            .customer_statements(&CustomerKey::from_raw("Sasha"), None)
            .await
            .unwrap();
        db.credits()
            .pay_credit(&sasha[0].credit.id, Money::from_cents(1_000))
            .await
            .unwrap();

        let first = db
            .credits()
            .outstanding_page(
                &CreditFilter::default(),
                None,
                PageRequest::new(Some(1), Some(3)).unwrap(),
            )
            .await
            .unwrap();
        let names: Vec<_> = first.data.iter().map(|s| s.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Asha", "Bilal", "Carol"]);
        assert_eq!(first.pagination.total, 4);
        assert_eq!(first.pagination.total_pages, 2);

        // Sasha is settled, so only Asha matches
        let searched = db
            .credits()
            .outstanding_page(&CreditFilter::default(), Some("SHA"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(searched.pagination.total, 1);
        assert_eq!(searched.data[0].customer_name, "Asha");
    }

    #[tokio::test]
    async fn test_customer_statements_newest_first() {
        let db = test_db().await;
        let older = seed_credit(&db, "Asha", 1_000, 0).await;
        let newer = seed_credit(&db, "Asha", 2_000, 30).await;
        seed_credit(&db, "Bilal", 3_000, 15).await;

        let statements = db
            .credits()
            .customer_statements(&CustomerKey::from_raw("Asha"), None)
            .await
            .unwrap();
        let ids: Vec<_> = statements.iter().map(|s| s.credit.id.clone()).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let none = db
            .credits()
            .customer_statements(&CustomerKey::from_raw("Nobody"), None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
