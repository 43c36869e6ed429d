//! # Sale Repository
//!
//! Database operations for deferred-payment sales and their items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Credit Sale Lifecycle                             │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     └── create_credit_sale()                                           │
//! │         ├── Sale   { status: Pending, payment_method: Credit }        │
//! │         ├── SaleItem × n (name/price snapshots)                        │
//! │         └── Credit { type: SaleCredit, amount_owed: sale total }      │
//! │                                                                         │
//! │  2. PAYMENTS                                                           │
//! │     └── CreditRepository::pay_credit / pay_customer                    │
//! │                                                                         │
//! │  3. SETTLE (inside the payment transaction)                            │
//! │     └── mark_completed() → Sale { status: Completed }                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::credit::insert_credit;
use tally_core::validation::{
    validate_customer_id, validate_customer_name, validate_description, validate_item_name,
    validate_price_cents, validate_quantity, validate_sale_item_count, validate_sale_total,
    validate_unit_type,
};
use tally_core::{
    Credit, CreditType, Money, PaymentMethod, Sale, SaleDetail, SaleItem, SaleStatus,
    ValidationError,
};

const SELECT_SALE: &str = r#"
    SELECT
        id, customer_id, customer_name, status, payment_method, total_cents,
        notes, created_at, updated_at, completed_at
    FROM sales
    WHERE id = ?1
"#;

const SELECT_SALE_ITEMS: &str = r#"
    SELECT
        id, sale_id, name_snapshot, unit_type, unit_price_cents,
        quantity, line_total_cents, created_at
    FROM sale_items
    WHERE sale_id = ?1
    ORDER BY created_at, rowid
"#;

const SELECT_SALE_CREDIT: &str = r#"
    SELECT
        id, customer_id, customer_name, amount_owed_cents, due_date,
        description, credit_type, sale_id, created_at
    FROM credits
    WHERE sale_id = ?1
"#;

const INSERT_SALE: &str = r#"
    INSERT INTO sales (
        id, customer_id, customer_name, status, payment_method,
        total_cents, notes, created_at, updated_at, completed_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

const INSERT_SALE_ITEM: &str = r#"
    INSERT INTO sale_items (
        id, sale_id, name_snapshot, unit_type, unit_price_cents,
        quantity, line_total_cents, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

// =============================================================================
// Drafts
// =============================================================================

/// One line of a credit sale as entered at the till.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub name: String,
    pub unit_type: String,
    pub unit_price: Money,
    pub quantity: i64,
}

/// A sale the customer takes home now and pays for later.
#[derive(Debug, Clone)]
pub struct NewCreditSale {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub items: Vec<NewSaleItem>,
    /// Callers default this with `ledger::default_due_date`.
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(SELECT_SALE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in entry order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(SELECT_SALE_ITEMS)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a sale with its items and the credit it opened.
    pub async fn detail(&self, id: &str) -> DbResult<SaleDetail> {
        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(SELECT_SALE)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items = sqlx::query_as::<_, SaleItem>(SELECT_SALE_ITEMS)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let credit = sqlx::query_as::<_, Credit>(SELECT_SALE_CREDIT)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SaleDetail { sale, items, credit })
    }

    /// Records a deferred-payment sale and opens its credit.
    ///
    /// ## What This Does
    /// 1. Validates customer and items, snapshots each line's total
    /// 2. Inserts the sale (`Pending`, paid by `Credit`)
    /// 3. Inserts the items
    /// 4. Inserts a `SaleCredit` owing the sale total
    ///
    /// Everything happens in one transaction: a sale never exists without
    /// its credit.
    pub async fn create_credit_sale(&self, draft: NewCreditSale) -> DbResult<SaleDetail> {
        let customer_name = validate_customer_name(&draft.customer_name)?;
        let customer_id = validate_customer_id(draft.customer_id.as_deref())?;
        let description = validate_description(draft.description.as_deref())?;
        let notes = draft
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        validate_sale_item_count(draft.items.len())?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let items = draft
            .items
            .iter()
            .map(|item| snapshot_item(&sale_id, item, now))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let total = items.iter().try_fold(0i64, |acc, item| {
            acc.checked_add(item.line_total_cents)
                .ok_or_else(|| ValidationError::InvalidFormat {
                    field: "items".to_string(),
                    reason: "sale total is too large".to_string(),
                })
        })?;
        validate_sale_total(total)?;

        let sale = Sale {
            id: sale_id.clone(),
            customer_id: customer_id.clone(),
            customer_name: Some(customer_name.clone()),
            status: SaleStatus::Pending,
            payment_method: PaymentMethod::Credit,
            total_cents: total,
            notes,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let credit = Credit {
            id: Uuid::new_v4().to_string(),
            customer_id,
            customer_name,
            amount_owed_cents: total,
            due_date: Some(draft.due_date),
            description,
            credit_type: CreditType::SaleCredit,
            sale_id: Some(sale_id.clone()),
            created_at: now,
        };

        debug!(sale_id = %sale.id, items = items.len(), "Creating credit sale");

        let mut tx = begin_write(&self.pool).await?;

        insert_sale(&mut *tx, &sale).await?;
        for item in &items {
            insert_sale_item(&mut *tx, item).await?;
        }
        insert_credit(&mut *tx, &credit).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            credit_id = %credit.id,
            customer = %credit.customer_key(),
            total = %Money::from_cents(total),
            "Credit sale recorded"
        );

        Ok(SaleDetail {
            sale,
            items,
            credit: Some(credit),
        })
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn snapshot_item(
    sale_id: &str,
    item: &NewSaleItem,
    now: DateTime<Utc>,
) -> Result<SaleItem, ValidationError> {
    let name = validate_item_name(&item.name)?;
    let unit_type = validate_unit_type(&item.unit_type)?;
    validate_price_cents(item.unit_price.cents())?;
    validate_quantity(item.quantity)?;

    let line_total = item
        .unit_price
        .checked_multiply_quantity(item.quantity)
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: "unit_price".to_string(),
            reason: "line total is too large".to_string(),
        })?;

    Ok(SaleItem {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        name_snapshot: name,
        unit_type,
        unit_price_cents: item.unit_price.cents(),
        quantity: item.quantity,
        line_total_cents: line_total.cents(),
        created_at: now,
    })
}

async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(INSERT_SALE)
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(sale.status)
        .bind(sale.payment_method)
        .bind(sale.total_cents)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(executor)
        .await?;

    Ok(())
}

async fn insert_sale_item<'e, E>(executor: E, item: &SaleItem) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(INSERT_SALE_ITEM)
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.name_snapshot)
        .bind(&item.unit_type)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(executor)
        .await?;

    Ok(())
}

/// Marks a pending sale completed once its credit is settled.
///
/// Returns `false` when the sale was not pending (already completed or
/// voided); that is not an error for the payment that settled it.
pub(crate) async fn mark_completed<'e, E>(
    executor: E,
    sale_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE sales SET
            status = 'completed',
            completed_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(sale_id)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tally_core::{CoreError, MAX_AMOUNT_CENTS};

    fn item(name: &str, price: i64, qty: i64) -> NewSaleItem {
        NewSaleItem {
            name: name.to_string(),
            unit_type: "pcs".to_string(),
            unit_price: Money::from_cents(price),
            quantity: qty,
        }
    }

    fn draft(items: Vec<NewSaleItem>) -> NewCreditSale {
        NewCreditSale {
            customer_id: None,
            customer_name: "  Asha  ".to_string(),
            items,
            due_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            description: Some("Weekly groceries".to_string()),
            notes: Some("   ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_credit_sale_opens_credit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let detail = db
            .sales()
            .create_credit_sale(draft(vec![item("Rice 5kg", 1_250, 2), item("Tea", 500, 1)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, 3_000);
        assert_eq!(detail.sale.status, SaleStatus::Pending);
        assert_eq!(detail.sale.payment_method, PaymentMethod::Credit);
        assert_eq!(detail.sale.notes, None);
        assert_eq!(detail.items.len(), 2);

        let credit = detail.credit.unwrap();
        assert_eq!(credit.amount_owed_cents, 3_000);
        assert_eq!(credit.customer_name, "Asha");
        assert_eq!(credit.credit_type, CreditType::SaleCredit);
        assert_eq!(credit.sale_id.as_deref(), Some(detail.sale.id.as_str()));

        let stored = db.sales().detail(&detail.sale.id).await.unwrap();
        assert_eq!(stored.sale.total_cents, 3_000);
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].line_total_cents, 2_500);
        assert_eq!(stored.credit.map(|c| c.id), Some(credit.id));
    }

    #[tokio::test]
    async fn test_create_credit_sale_rejects_empty_and_free_sales() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let empty = db.sales().create_credit_sale(draft(vec![])).await;
        assert!(matches!(
            empty,
            Err(DbError::Core(CoreError::Validation(ValidationError::Required { .. })))
        ));

        let free = db
            .sales()
            .create_credit_sale(draft(vec![item("Sample", 0, 1)]))
            .await;
        assert!(matches!(
            free,
            Err(DbError::Core(CoreError::Validation(ValidationError::MustBePositive { .. })))
        ));

        let bad_qty = db
            .sales()
            .create_credit_sale(draft(vec![item("Tea", 500, 0)]))
            .await;
        assert!(bad_qty.is_err());

        // each line is allowed, the total is not
        let huge = db
            .sales()
            .create_credit_sale(draft(vec![item("Gold", MAX_AMOUNT_CENTS, 2)]))
            .await;
        assert!(matches!(
            huge,
            Err(DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn test_detail_of_missing_sale_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let result = db.sales().detail("no-such-sale").await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
        assert!(db.sales().get_by_id("no-such-sale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_completed_only_touches_pending_sales() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let detail = db
            .sales()
            .create_credit_sale(draft(vec![item("Tea", 500, 1)]))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(mark_completed(db.pool(), &detail.sale.id, now).await.unwrap());
        assert!(!mark_completed(db.pool(), &detail.sale.id, now).await.unwrap());

        let sale = db.sales().get_by_id(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Completed);
        assert!(sale.completed_at.is_some());
    }
}
