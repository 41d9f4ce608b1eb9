//! # Sale Repository
//!
//! Database operations for sale headers and lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMPOSE (vendo-engine, one transaction)                             │
//! │     ├── insert_sale()    → header with final totals                     │
//! │     ├── insert_line()    → one row per cart line                        │
//! │     └── stock decrement + movements (StockRepository)                   │
//! │                                                                         │
//! │  2. COMMITTED sales are append-only: no update or delete path exists    │
//! │     in the engine. Status changes (void, refund) are separate           │
//! │     documents in a later milestone.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vendo_core::{Sale, SaleLine, SaleStatus};

const SALE_COLUMNS: &str = "id, tenant_id, branch_id, invoice_no, customer_id, customer_name, \
     subtotal_cents, discount_cents, tax_cents, total_cents, status, notes, sale_date, \
     created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price_cents, line_total_cents, created_at";

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

    /// Inserts a sale header on the caller's transaction.
    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, invoice_no = %sale.invoice_no, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales ( \
                id, tenant_id, branch_id, invoice_no, customer_id, customer_name, \
                subtotal_cents, discount_cents, tax_cents, total_cents, status, notes, \
                sale_date, created_at, updated_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&sale.id)
        .bind(sale.tenant_id)
        .bind(sale.branch_id)
        .bind(&sale.invoice_no)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(sale.sale_date)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one sale line on the caller's transaction.
    pub async fn insert_line(&self, conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
        debug!(sale_id = %line.sale_id, product_id = %line.product_id, "Inserting sale line");

        sqlx::query(
            "INSERT INTO sale_lines ( \
                id, sale_id, product_id, quantity, unit_price_cents, line_total_cents, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID, scoped to a tenant.
    pub async fn get_by_id(&self, tenant_id: i64, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by its invoice number.
    pub async fn get_by_invoice(
        &self,
        tenant_id: i64,
        invoice_no: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND invoice_no = ?2"
        ))
        .bind(tenant_id)
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all lines for a sale, in insertion order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Counts sales for a tenant with a given status (diagnostics, tests).
    pub async fn count_by_status(&self, tenant_id: i64, status: SaleStatus) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE tenant_id = ?1 AND status = ?2")
                .bind(tenant_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale line ID.
pub fn generate_sale_line_id() -> String {
    Uuid::new_v4().to_string()
}
