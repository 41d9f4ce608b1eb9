//! # Stock Transfer Repository
//!
//! Persistence for transfer headers and lines. The two-branch stock
//! mechanics live in the engine's transfer coordinator; this repository
//! only records what was moved.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vendo_core::{StockTransfer, TransferLine};

const TRANSFER_COLUMNS: &str = "id, tenant_id, from_branch_id, to_branch_id, reference, \
     transfer_date, notes, created_at";

/// Repository for stock transfer documents.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    /// Creates a new TransferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    /// Inserts a transfer header on the caller's transaction.
    pub async fn insert_transfer(
        &self,
        conn: &mut SqliteConnection,
        transfer: &StockTransfer,
    ) -> DbResult<()> {
        debug!(id = %transfer.id, reference = %transfer.reference, "Inserting stock transfer");

        sqlx::query(
            "INSERT INTO stock_transfers ( \
                id, tenant_id, from_branch_id, to_branch_id, reference, \
                transfer_date, notes, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&transfer.id)
        .bind(transfer.tenant_id)
        .bind(transfer.from_branch_id)
        .bind(transfer.to_branch_id)
        .bind(&transfer.reference)
        .bind(transfer.transfer_date)
        .bind(&transfer.notes)
        .bind(transfer.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one transfer line on the caller's transaction.
    pub async fn insert_line(
        &self,
        conn: &mut SqliteConnection,
        line: &TransferLine,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO stock_transfer_lines (id, transfer_id, product_id, quantity) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&line.id)
        .bind(&line.transfer_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a transfer by ID, scoped to a tenant.
    pub async fn get_by_id(&self, tenant_id: i64, id: &str) -> DbResult<Option<StockTransfer>> {
        let transfer = sqlx::query_as::<_, StockTransfer>(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM stock_transfers WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transfer)
    }

    /// Gets all lines for a transfer.
    pub async fn get_lines(&self, transfer_id: &str) -> DbResult<Vec<TransferLine>> {
        let lines = sqlx::query_as::<_, TransferLine>(
            "SELECT id, transfer_id, product_id, quantity \
             FROM stock_transfer_lines WHERE transfer_id = ?1 ORDER BY id",
        )
        .bind(transfer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}

/// Generates a new transfer ID.
pub fn generate_transfer_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new transfer line ID.
pub fn generate_transfer_line_id() -> String {
    Uuid::new_v4().to_string()
}
