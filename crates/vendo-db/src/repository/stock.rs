//! # Stock Repository
//!
//! Row operations on stock levels and the append-only movement log. The
//! verify-then-mutate *protocol* lives in vendo-engine; this module owns
//! the primitives it is built from.
//!
//! ## The Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE stock_levels                                                    │
//! │     SET quantity = quantity - ?q                                        │
//! │   WHERE tenant_id = ? AND branch_id = ? AND product_id = ?              │
//! │     AND quantity >= ?q              ← the guard                         │
//! │                                                                         │
//! │  rows_affected = 1  → decrement applied, stock stayed >= 0              │
//! │  rows_affected = 0  → row missing OR would go negative; the engine      │
//! │                       aborts the surrounding transaction                │
//! │                                                                         │
//! │  The check and the write are one statement, so no interleaving can      │
//! │  ever drive a tracked product's quantity below zero.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vendo_core::StockMovement;

const MOVEMENT_COLUMNS: &str = "id, tenant_id, branch_id, product_id, direction, quantity, \
     reason, source_id, note, created_at";

/// Repository for stock levels and movements.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // =========================================================================
    // Levels
    // =========================================================================

    /// Current on-hand quantity, read outside any transaction.
    /// A missing row reads as zero stock.
    pub async fn on_hand(
        &self,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
    ) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_levels \
             WHERE tenant_id = ?1 AND branch_id = ?2 AND product_id = ?3",
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Current on-hand quantity on the caller's transaction. Within a
    /// write transaction this read is stable until commit (the writer
    /// holds the database write lock).
    pub async fn quantity(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
    ) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_levels \
             WHERE tenant_id = ?1 AND branch_id = ?2 AND product_id = ?3",
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Guarded decrement. Returns `true` when the decrement applied,
    /// `false` when the row is missing or the guard (`quantity >= qty`)
    /// failed; the caller aborts its transaction on `false`.
    pub async fn try_decrement(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
        qty: i64,
    ) -> DbResult<bool> {
        debug_assert!(qty > 0);
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE stock_levels \
             SET quantity = quantity - ?4, updated_at = ?5 \
             WHERE tenant_id = ?1 AND branch_id = ?2 AND product_id = ?3 \
               AND quantity >= ?4",
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .bind(qty)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Credits stock, inserting the level row on first contact with a
    /// (tenant, branch, product) triple.
    pub async fn credit(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
        qty: i64,
    ) -> DbResult<()> {
        debug_assert!(qty > 0);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO stock_levels (tenant_id, branch_id, product_id, quantity, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (tenant_id, branch_id, product_id) \
             DO UPDATE SET quantity = quantity + excluded.quantity, \
                           updated_at = excluded.updated_at",
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .bind(qty)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Movements
    // =========================================================================

    /// Appends one movement record on the caller's transaction.
    /// Movements are insert-only; there is no update or delete path.
    pub async fn insert_movement(
        &self,
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        debug!(
            product_id = %movement.product_id,
            quantity = movement.quantity,
            direction = ?movement.direction,
            "Appending stock movement"
        );

        sqlx::query(
            "INSERT INTO stock_movements ( \
                id, tenant_id, branch_id, product_id, direction, quantity, \
                reason, source_id, note, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&movement.id)
        .bind(movement.tenant_id)
        .bind(movement.branch_id)
        .bind(&movement.product_id)
        .bind(movement.direction)
        .bind(movement.quantity)
        .bind(movement.reason)
        .bind(&movement.source_id)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Movement audit trail for a product at a branch, newest first.
    pub async fn movements(
        &self,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE tenant_id = ?1 AND branch_id = ?2 AND product_id = ?3 \
             ORDER BY created_at DESC, id DESC LIMIT ?4"
        ))
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Signed sum of all movements for a product at a branch. Must equal
    /// the current stock level; `InventoryLedger::reconcile` asserts it.
    pub async fn movement_sum(
        &self,
        tenant_id: i64,
        branch_id: i64,
        product_id: &str,
    ) -> DbResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE WHEN direction = 'in' THEN quantity ELSE -quantity END), 0) \
             FROM stock_movements \
             WHERE tenant_id = ?1 AND branch_id = ?2 AND product_id = ?3",
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}

/// Generates a new movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use vendo_core::Product;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            tenant_id: 1,
            sku: "SKU-1".into(),
            name: "Product".into(),
            stock_tracked: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_missing_row_reads_as_zero() {
        let (db, product_id) = setup().await;
        assert_eq!(db.stock().on_hand(1, 0, &product_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_credit_inserts_then_accumulates() {
        let (db, product_id) = setup().await;
        let stock = db.stock();

        let mut tx = db.pool().begin().await.unwrap();
        stock.credit(&mut tx, 1, 2, &product_id, 10).await.unwrap();
        stock.credit(&mut tx, 1, 2, &product_id, 5).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(stock.on_hand(1, 2, &product_id).await.unwrap(), 15);
        // Another branch is a separate bucket
        assert_eq!(stock.on_hand(1, 3, &product_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let (db, product_id) = setup().await;
        let stock = db.stock();

        let mut tx = db.pool().begin().await.unwrap();
        stock.credit(&mut tx, 1, 0, &product_id, 3).await.unwrap();

        // Exactly available: passes
        assert!(stock.try_decrement(&mut tx, 1, 0, &product_id, 3).await.unwrap());
        // Now empty: guard refuses
        assert!(!stock.try_decrement(&mut tx, 1, 0, &product_id, 1).await.unwrap());
        // Missing row: guard refuses
        assert!(!stock.try_decrement(&mut tx, 1, 9, &product_id, 1).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(stock.on_hand(1, 0, &product_id).await.unwrap(), 0);
    }
}
