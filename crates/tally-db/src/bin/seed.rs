//! # Seed Data Generator
//!
//! Populates the database with demo customers and credit activity.
//!
//! ## Usage
//! ```bash
//! # Seed 8 customers (default)
//! cargo run -p tally-db --bin seed
//!
//! # More customers
//! cargo run -p tally-db --bin seed -- --customers 20
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! For every customer:
//! - One or two credit sales (1-4 grocery lines each, due in 30 days)
//! - Every third customer also gets a general credit (walk-in tab)
//! - Every other customer makes a partial bulk payment
//! - Every fourth customer pays everything off (drops out of listings)

use anyhow::Context;
use chrono::{Duration, Utc};
use std::env;
use tally_core::ledger::default_due_date;
use tally_core::{CustomerKey, Money, DEFAULT_CREDIT_TERM_DAYS};
use tally_db::{CreditFilter, Database, DbConfig, NewCredit, NewCreditSale, NewSaleItem};

const CUSTOMERS: &[&str] = &[
    "Asha Khan",
    "Bilal Ahmed",
    "Carol Mendes",
    "Danish Raza",
    "Elif Yilmaz",
    "Farah Siddiqui",
    "Gul Noor",
    "Hamza Iqbal",
    "Irfan Malik",
    "Javeria Aslam",
];

/// (name, unit type, unit price in cents)
const ITEMS: &[(&str, &str, i64)] = &[
    ("Basmati Rice", "kg", 420),
    ("Cooking Oil", "ltr", 650),
    ("Sugar", "kg", 180),
    ("Tea Leaves", "pack", 390),
    ("Flour", "kg", 140),
    ("Lentils", "kg", 310),
    ("Milk Powder", "tin", 1_150),
    ("Soap", "pcs", 95),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut customers: usize = 8;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customers = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid customer count: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Number of customers to generate (default: 8)");
                println!("  -d, --db <PATH>      Database file path (default: ./tally_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", customers);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.credits().statements(&CreditFilter::default()).await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} credits", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating credit activity...");

    let start = std::time::Instant::now();
    let due_date = default_due_date(Utc::now().date_naive(), DEFAULT_CREDIT_TERM_DAYS);
    let mut sales = 0;
    let mut payments = 0;

    for seed in 0..customers {
        let base_name = CUSTOMERS[seed % CUSTOMERS.len()];
        let name = if seed < CUSTOMERS.len() {
            base_name.to_string()
        } else {
            format!("{} {}", base_name, seed / CUSTOMERS.len() + 1)
        };

        for sale_idx in 0..(1 + seed % 2) {
            db.sales()
                .create_credit_sale(NewCreditSale {
                    customer_id: None,
                    customer_name: name.clone(),
                    items: generate_items(seed * 7 + sale_idx),
                    due_date,
                    description: Some(format!("Groceries #{}", sale_idx + 1)),
                    notes: None,
                })
                .await?;
            sales += 1;
        }

        if seed % 3 == 0 {
            db.credits()
                .create_general_credit(NewCredit {
                    customer_id: None,
                    customer_name: name.clone(),
                    amount_owed: Money::from_cents(1_000 + (seed as i64 * 250) % 4_000),
                    // Already past due so listings show overdue customers
                    due_date: Some(Utc::now().date_naive() - Duration::days(3)),
                    description: Some("Cash advance".to_string()),
                })
                .await?;
        }

        let key = CustomerKey::from_raw(name.as_str());
        let owed: Money = db
            .credits()
            .customer_statements(&key, None)
            .await?
            .iter()
            .map(|s| s.remaining())
            .sum();

        let pay = if seed % 4 == 3 {
            owed
        } else if seed % 2 == 1 {
            Money::from_cents(owed.cents() / 2)
        } else {
            Money::zero()
        };

        if pay.is_positive() {
            let receipt = db.credits().pay_customer(&key, pay).await?;
            payments += receipt.payments.len();
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} credit sales and {} payments in {:?}",
        sales, payments, elapsed
    );

    let outstanding = db
        .credits()
        .outstanding_customers(&CreditFilter::default())
        .await?;
    let total = db.credits().total_outstanding().await?;
    println!("  Customers with a balance: {}", outstanding.len());
    println!("  Total outstanding:        {}", total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Picks 1-4 grocery lines for a sale.
fn generate_items(seed: usize) -> Vec<NewSaleItem> {
    let lines = 1 + seed % 4;
    (0..lines)
        .map(|line| {
            let (name, unit_type, price) = ITEMS[(seed + line * 3) % ITEMS.len()];
            NewSaleItem {
                name: name.to_string(),
                unit_type: unit_type.to_string(),
                unit_price: Money::from_cents(price),
                quantity: 1 + ((seed + line) % 5) as i64,
            }
        })
        .collect()
}
