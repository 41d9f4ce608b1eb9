//! # Seed Data Generator
//!
//! Populates a database with demo data for development: a tenant with
//! products, opening stock across three branches and a small chart of
//! accounts.
//!
//! ## Usage
//! ```bash
//! # Seed ./vendo.db with 60 products (default)
//! cargo run -p vendo-db --bin seed
//!
//! # Custom database path and product count
//! cargo run -p vendo-db --bin seed -- --db ./data/vendo.db --count 200
//!
//! # Custom tenant id
//! cargo run -p vendo-db --bin seed -- --tenant 2
//! ```

use chrono::Utc;
use std::env;
use tracing::info;
use uuid::Uuid;

use vendo_core::{Account, AccountKind, MovementDirection, MovementReason, Product, StockMovement};
use vendo_db::{Database, DbConfig};

/// Product categories for realistic demo data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coca-Cola 330ml",
            "Sparkling Water 500ml",
            "Orange Juice 1L",
            "Cold Brew Coffee",
            "Green Tea Bottle",
            "Energy Drink 250ml",
        ],
    ),
    (
        "SNK",
        &[
            "Salted Chips",
            "Chocolate Bar",
            "Trail Mix",
            "Oat Cookies",
            "Salted Peanuts",
            "Gummy Bears",
        ],
    ),
    (
        "GRC",
        &[
            "Basmati Rice 1kg",
            "Penne Pasta 500g",
            "Olive Oil 750ml",
            "Canned Tomatoes",
            "Black Pepper 100g",
            "Honey Jar 350g",
        ],
    ),
    (
        "SVC",
        &[
            // Services are not stock-tracked
            "Gift Wrapping",
            "Home Delivery",
        ],
    ),
];

/// Opening chart of accounts: (code, name, kind).
const ACCOUNTS: &[(&str, &str, AccountKind)] = &[
    ("1000", "Cash on Hand", AccountKind::Asset),
    ("1010", "Bank Account", AccountKind::Asset),
    ("1200", "Inventory", AccountKind::Asset),
    ("2000", "Accounts Payable", AccountKind::Liability),
    ("3000", "Owner Equity", AccountKind::Equity),
    ("4000", "Sales Revenue", AccountKind::Income),
    ("5000", "Rent Expense", AccountKind::Expense),
    ("5100", "Utilities Expense", AccountKind::Expense),
];

struct Args {
    db_path: String,
    tenant_id: i64,
    count: usize,
}

fn parse_args() -> Args {
    let mut args = Args {
        db_path: "./vendo.db".to_string(),
        tenant_id: 1,
        count: 60,
    };

    let argv: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--db" if i + 1 < argv.len() => {
                args.db_path = argv[i + 1].clone();
                i += 2;
            }
            "--tenant" if i + 1 < argv.len() => {
                args.tenant_id = argv[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "--count" if i + 1 < argv.len() => {
                args.count = argv[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }

    args
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();
    info!(db = %args.db_path, tenant = args.tenant_id, count = args.count, "Seeding database");

    let db = Database::new(DbConfig::new(&args.db_path)).await?;

    seed_accounts(&db, args.tenant_id).await?;
    seed_products(&db, args.tenant_id, args.count).await?;

    let products = db.products().count(args.tenant_id).await?;
    info!(products, "Seed complete");

    db.close().await;
    Ok(())
}

async fn seed_accounts(db: &Database, tenant_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let journals = db.journals();
    let now = Utc::now();

    for (code, name, kind) in ACCOUNTS {
        if journals.get_account_by_code(tenant_id, code).await?.is_some() {
            continue;
        }
        journals
            .insert_account(&Account {
                id: Uuid::new_v4().to_string(),
                tenant_id,
                code: code.to_string(),
                name: name.to_string(),
                kind: *kind,
                is_active: true,
                created_at: now,
            })
            .await?;
    }

    info!(accounts = ACCOUNTS.len(), "Chart of accounts seeded");
    Ok(())
}

async fn seed_products(
    db: &Database,
    tenant_id: i64,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let products = db.products();
    let stock = db.stock();
    let now = Utc::now();

    let mut seeded = 0usize;
    'outer: for round in 0usize.. {
        for (prefix, names) in CATEGORIES {
            for (n, name) in names.iter().enumerate() {
                if seeded >= count {
                    break 'outer;
                }

                let sku = format!("{}-{:03}", prefix, round * names.len() + n + 1);
                if products.get_by_sku(tenant_id, &sku).await?.is_some() {
                    seeded += 1;
                    continue;
                }

                let tracked = *prefix != "SVC";
                let product = Product {
                    id: Uuid::new_v4().to_string(),
                    tenant_id,
                    sku: sku.clone(),
                    name: if round == 0 {
                        name.to_string()
                    } else {
                        format!("{name} #{round}")
                    },
                    stock_tracked: tracked,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                products.insert(&product).await?;

                // Opening stock across branches 0..=2, derived from the
                // index so reseeding is deterministic
                if tracked {
                    for branch_id in 0..3i64 {
                        let qty = 10 + ((seeded as i64 * 7 + branch_id * 13) % 90);
                        let mut tx = db.pool().begin().await?;
                        stock
                            .credit(&mut tx, tenant_id, branch_id, &product.id, qty)
                            .await?;
                        stock
                            .insert_movement(
                                &mut tx,
                                &StockMovement {
                                    id: Uuid::new_v4().to_string(),
                                    tenant_id,
                                    branch_id,
                                    product_id: product.id.clone(),
                                    direction: MovementDirection::In,
                                    quantity: qty,
                                    reason: MovementReason::Adjustment,
                                    source_id: None,
                                    note: Some("opening stock".to_string()),
                                    created_at: now,
                                },
                            )
                            .await?;
                        tx.commit().await?;
                    }
                }

                seeded += 1;
            }
        }
    }

    info!(seeded, "Products seeded");
    Ok(())
}
