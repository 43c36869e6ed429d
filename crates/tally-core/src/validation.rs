//! # Validation Module
//!
//! Input validation utilities for Tally.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend form                                                │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization, integer cents)             │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger rules (ledger.rs)                                     │
//! │  └── Amount vs remaining / outstanding balance                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── CHECK (amount > 0) constraints                                    │
//! │  └── Append-only triggers on credit_payments                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{
    MAX_AMOUNT_CENTS, MAX_CREDIT_TERM_DAYS, MAX_ITEM_QUANTITY, MAX_PAGE_LIMIT, MAX_SALE_ITEMS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CUSTOMER_NAME_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_ITEM_NAME_LEN: usize = 200;
const MAX_UNIT_TYPE_LEN: usize = 16;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 120 characters
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_customer_name;
///
/// assert_eq!(validate_customer_name("  Asha ").unwrap(), "Asha");
/// assert!(validate_customer_name("   ").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".to_string(),
        });
    }

    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates an optional customer id, returning `None` for blank input.
pub fn validate_customer_id(id: Option<&str>) -> ValidationResult<Option<String>> {
    match id.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => {
            validate_uuid_field("customer_id", id)?;
            Ok(Some(id.to_string()))
        }
    }
}

/// Validates an optional free-text description, returning `None` for blank input.
pub fn validate_description(description: Option<&str>) -> ValidationResult<Option<String>> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        }),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Validates a sale line's product name snapshot.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a selling unit label ("pcs", "kg", ...).
pub fn validate_unit_type(unit: &str) -> ValidationResult<String> {
    let unit = unit.trim();

    if unit.is_empty() {
        return Err(ValidationError::Required {
            field: "unit_type".to_string(),
        });
    }

    if unit.chars().count() > MAX_UNIT_TYPE_LEN {
        return Err(ValidationError::TooLong {
            field: "unit_type".to_string(),
            max: MAX_UNIT_TYPE_LEN,
        });
    }

    Ok(unit.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the amount a new credit is opened for.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_AMOUNT_CENTS
pub fn validate_amount_owed(cents: i64) -> ValidationResult<()> {
    validate_amount("amount_owed", cents)
}

/// Validates a payment amount in cents.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_AMOUNT_CENTS
/// - Remaining / outstanding bounds are ledger rules, not checked here
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    validate_amount("amount", cents)
}

/// Validates a sale's computed total before it becomes a credit.
pub fn validate_sale_total(cents: i64) -> ValidationResult<()> {
    validate_amount("total", cents)
}

fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_AMOUNT_CENTS
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates the number of lines on a credit sale.
///
/// ## Rules
/// - At least one line
/// - At most MAX_SALE_ITEMS (100)
pub fn validate_sale_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates the default number of days a credit sale runs before it is due.
pub fn validate_credit_term_days(days: i64) -> ValidationResult<()> {
    if !(0..=MAX_CREDIT_TERM_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "credit_term_days".to_string(),
            min: 0,
            max: MAX_CREDIT_TERM_DAYS,
        });
    }

    Ok(())
}

/// Listing pages start at 1.
pub fn validate_page(page: u32) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    Ok(())
}

/// Validates rows per page: 1 to MAX_PAGE_LIMIT (100).
pub fn validate_page_limit(limit: u32) -> ValidationResult<()> {
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_LIMIT),
        });
    }

    Ok(())
}

/// Rejects blank or non-UUID ids.
fn validate_uuid_field(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name("Asha Rao").unwrap(), "Asha Rao");
        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(121)).is_err());
        assert!(validate_customer_name(&"A".repeat(120)).is_ok());
    }

    #[test]
    fn test_validate_customer_id() {
        assert_eq!(validate_customer_id(None).unwrap(), None);
        assert_eq!(validate_customer_id(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_customer_id(Some("550e8400-e29b-41d4-a716-446655440000")).unwrap(),
            Some("550e8400-e29b-41d4-a716-446655440000".to_string())
        );
        assert!(matches!(
            validate_customer_id(Some("walk-in")),
            Err(ValidationError::InvalidFormat { field, .. }) if field == "customer_id"
        ));
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(validate_description(Some(" ")).unwrap(), None);
        assert_eq!(
            validate_description(Some(" groceries ")).unwrap(),
            Some("groceries".to_string())
        );
        assert!(validate_description(Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount_owed(1).is_ok());
        assert!(validate_amount_owed(0).is_err());
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-100).is_err());
    }

    #[test]
    fn test_amounts_are_capped() {
        assert!(validate_amount_owed(MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount_owed(MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { field, .. }) if field == "amount_owed"
        ));
        assert!(validate_amount_owed(i64::MAX / 2 + 1).is_err());

        assert!(validate_payment_amount(MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_payment_amount(MAX_AMOUNT_CENTS + 1).is_err());

        assert!(validate_price_cents(MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_price_cents(MAX_AMOUNT_CENTS + 1).is_err());

        assert!(validate_sale_total(MAX_AMOUNT_CENTS + 1).is_err());
        assert!(validate_sale_total(0).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_sale_item_count() {
        assert!(validate_sale_item_count(0).is_err());
        assert!(validate_sale_item_count(1).is_ok());
        assert!(validate_sale_item_count(101).is_err());
    }

    #[test]
    fn test_validate_unit_and_price() {
        assert_eq!(validate_unit_type(" kg ").unwrap(), "kg");
        assert!(validate_unit_type("").is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_paging() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_page_limit(1).is_ok());
        assert!(validate_page_limit(100).is_ok());
        assert!(validate_page_limit(0).is_err());
        assert!(validate_page_limit(101).is_err());
    }

    #[test]
    fn test_validate_credit_term_days() {
        assert!(validate_credit_term_days(0).is_ok());
        assert!(validate_credit_term_days(30).is_ok());
        assert!(validate_credit_term_days(366).is_err());
        assert!(validate_credit_term_days(-1).is_err());
    }
}
