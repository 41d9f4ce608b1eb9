//! # Inventory Ledger
//!
//! The authoritative per-(tenant, branch, product) on-hand store, guarded
//! by a verify-then-mutate protocol and mirrored by an append-only
//! movement log.
//!
//! ## The Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              verify-then-mutate, one write transaction                  │
//! │                                                                         │
//! │  demands (aggregated, product-id order)                                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  PHASE 1: verify ALL tracked products                                   │
//! │     current >= requested for each, else abort with the offender.        │
//! │     Non-tracked products are skipped outright: no check, no             │
//! │     mutation, no movement.                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  PHASE 2: mutate                                                        │
//! │     guarded decrement per product (re-checks atomically), then one      │
//! │     movement row per affected product.                                  │
//! │                                                                         │
//! │  Any failure anywhere → the caller's transaction rolls back whole.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The deterministic product-id order (callers aggregate into a BTreeMap)
//! is what keeps two overlapping multi-product operations from acquiring
//! row locks in conflicting orders.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use vendo_core::validation::validate_quantity;
use vendo_core::{MovementDirection, MovementReason, Product, StockMovement, ValidationError};
use vendo_db::Database;

use crate::context::TenantContext;
use crate::error::{EngineError, EngineResult};
use crate::resolve_product;

/// Result of comparing a stock level against its movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Reconciliation {
    pub on_hand: i64,
    pub movement_sum: i64,
}

impl Reconciliation {
    /// The level and the log agree.
    pub fn consistent(&self) -> bool {
        self.on_hand == self.movement_sum
    }
}

/// The inventory ledger service.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    /// Creates the service over a database handle.
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    // =========================================================================
    // Public operations (own their transaction)
    // =========================================================================

    /// Applies a manual stock adjustment in its own transaction and
    /// returns the movement that recorded it.
    ///
    /// Negative deltas are availability-checked; a tracked product's
    /// quantity never goes below zero. Adjusting a product that is not
    /// stock-tracked is rejected: silently "adjusting" untracked stock
    /// would record a movement with no level to reconcile against.
    pub async fn adjust(
        &self,
        ctx: &TenantContext,
        product_id: &str,
        delta: i64,
        note: Option<String>,
    ) -> EngineResult<StockMovement> {
        ctx.validate()?;
        if delta == 0 {
            return Err(ValidationError::ZeroDelta.into());
        }
        validate_quantity(product_id, delta.abs())?;

        let caps = self.db.capabilities().await?;
        let branch_id = caps.stock_branch(ctx.branch_id);

        let product = resolve_product(&self.db, ctx.tenant_id, product_id).await?;
        if !product.stock_tracked {
            return Err(ValidationError::NotStockTracked {
                product_id: product_id.to_string(),
            }
            .into());
        }

        let stock = self.db.stock();
        let mut tx = self.db.pool().begin().await?;

        let quantity = delta.abs();
        let direction = if delta < 0 {
            if !stock
                .try_decrement(&mut tx, ctx.tenant_id, branch_id, product_id, quantity)
                .await?
            {
                let available = stock
                    .quantity(&mut tx, ctx.tenant_id, branch_id, product_id)
                    .await?;
                return Err(EngineError::insufficient(&product, available, quantity));
            }
            MovementDirection::Out
        } else {
            stock
                .credit(&mut tx, ctx.tenant_id, branch_id, product_id, quantity)
                .await?;
            MovementDirection::In
        };

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: ctx.tenant_id,
            branch_id,
            product_id: product_id.to_string(),
            direction,
            quantity,
            reason: MovementReason::Adjustment,
            source_id: None,
            note,
            created_at: Utc::now(),
        };
        stock.insert_movement(&mut tx, &movement).await?;

        tx.commit().await?;

        info!(
            tenant_id = ctx.tenant_id,
            branch_id,
            product_id,
            delta,
            "Stock adjusted"
        );

        Ok(movement)
    }

    /// Current on-hand quantity for a product at the context's branch.
    /// A product with no stock row reads as zero.
    pub async fn on_hand(&self, ctx: &TenantContext, product_id: &str) -> EngineResult<i64> {
        ctx.validate()?;
        let caps = self.db.capabilities().await?;
        let branch_id = caps.stock_branch(ctx.branch_id);

        Ok(self
            .db
            .stock()
            .on_hand(ctx.tenant_id, branch_id, product_id)
            .await?)
    }

    /// Movement audit trail for a product, newest first.
    pub async fn movements(
        &self,
        ctx: &TenantContext,
        product_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<StockMovement>> {
        ctx.validate()?;
        let caps = self.db.capabilities().await?;
        let branch_id = caps.stock_branch(ctx.branch_id);

        Ok(self
            .db
            .stock()
            .movements(ctx.tenant_id, branch_id, product_id, limit)
            .await?)
    }

    /// Compares the stock level against the signed sum of its movements.
    /// Anything but `consistent()` means a mutation bypassed the ledger.
    pub async fn reconcile(
        &self,
        ctx: &TenantContext,
        product_id: &str,
    ) -> EngineResult<Reconciliation> {
        ctx.validate()?;
        let caps = self.db.capabilities().await?;
        let branch_id = caps.stock_branch(ctx.branch_id);

        let stock = self.db.stock();
        let on_hand = stock.on_hand(ctx.tenant_id, branch_id, product_id).await?;
        let movement_sum = stock
            .movement_sum(ctx.tenant_id, branch_id, product_id)
            .await?;

        Ok(Reconciliation {
            on_hand,
            movement_sum,
        })
    }

    // =========================================================================
    // Transaction-scoped helpers (composer / transfer coordinator)
    // =========================================================================

    /// Verifies and applies the aggregated stock decrements of a sale on
    /// the caller's transaction. `demands` must be in product-id order;
    /// `aggregate_demand` produces exactly that.
    pub(crate) async fn decrement_for_sale(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        branch_id: i64,
        demands: &[(Product, i64)],
        sale_id: &str,
    ) -> EngineResult<()> {
        let stock = self.db.stock();

        // Phase 1: verify everything before touching anything, so the
        // error names the first offender and no partial decrement happens
        for (product, qty) in demands.iter().filter(|(p, _)| p.stock_tracked) {
            let available = stock
                .quantity(&mut *conn, tenant_id, branch_id, &product.id)
                .await?;
            if available < *qty {
                debug!(product_id = %product.id, available, requested = qty, "Stock check failed");
                return Err(EngineError::insufficient(product, available, *qty));
            }
        }

        // Phase 2: mutate + one movement per affected product
        let now = Utc::now();
        for (product, qty) in demands.iter().filter(|(p, _)| p.stock_tracked) {
            if !stock
                .try_decrement(&mut *conn, tenant_id, branch_id, &product.id, *qty)
                .await?
            {
                // The guard lost a race the verify read could not see
                let available = stock
                    .quantity(&mut *conn, tenant_id, branch_id, &product.id)
                    .await?;
                return Err(EngineError::insufficient(product, available, *qty));
            }

            stock
                .insert_movement(
                    &mut *conn,
                    &StockMovement {
                        id: Uuid::new_v4().to_string(),
                        tenant_id,
                        branch_id,
                        product_id: product.id.clone(),
                        direction: MovementDirection::Out,
                        quantity: *qty,
                        reason: MovementReason::Sale,
                        source_id: Some(sale_id.to_string()),
                        note: None,
                        created_at: now,
                    },
                )
                .await?;
        }

        Ok(())
    }

    /// Moves one aggregated transfer line between branches on the
    /// caller's transaction: guarded decrement at the source, credit at
    /// the destination (inserting its level row on first contact), one
    /// movement per side.
    ///
    /// The availability check is source-side only; the destination is
    /// credited unconditionally once the source check passed.
    pub(crate) async fn apply_transfer_line(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: i64,
        from_branch_id: i64,
        to_branch_id: i64,
        product: &Product,
        qty: i64,
        transfer_id: &str,
    ) -> EngineResult<()> {
        let stock = self.db.stock();

        if !stock
            .try_decrement(&mut *conn, tenant_id, from_branch_id, &product.id, qty)
            .await?
        {
            let available = stock
                .quantity(&mut *conn, tenant_id, from_branch_id, &product.id)
                .await?;
            return Err(EngineError::insufficient(product, available, qty));
        }

        stock
            .credit(&mut *conn, tenant_id, to_branch_id, &product.id, qty)
            .await?;

        let now = Utc::now();
        for (branch_id, direction, reason) in [
            (
                from_branch_id,
                MovementDirection::Out,
                MovementReason::TransferOut,
            ),
            (
                to_branch_id,
                MovementDirection::In,
                MovementReason::TransferIn,
            ),
        ] {
            stock
                .insert_movement(
                    &mut *conn,
                    &StockMovement {
                        id: Uuid::new_v4().to_string(),
                        tenant_id,
                        branch_id,
                        product_id: product.id.clone(),
                        direction,
                        quantity: qty,
                        reason,
                        source_id: Some(transfer_id.to_string()),
                        note: None,
                        created_at: now,
                    },
                )
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_adjust_up_then_down() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "ADJ-1", true).await;
        let inventory = engine.inventory();

        inventory.adjust(&ctx, &product.id, 10, None).await.unwrap();
        assert_eq!(inventory.on_hand(&ctx, &product.id).await.unwrap(), 10);

        let movement = inventory
            .adjust(&ctx, &product.id, -4, Some("damaged".into()))
            .await
            .unwrap();
        assert_eq!(movement.direction, MovementDirection::Out);
        assert_eq!(movement.quantity, 4);
        assert_eq!(inventory.on_hand(&ctx, &product.id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_adjust_never_goes_negative() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "ADJ-2", true).await;
        let inventory = engine.inventory();

        inventory.adjust(&ctx, &product.id, 3, None).await.unwrap();

        let err = inventory
            .adjust(&ctx, &product.id, -5, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));

        // Failed adjustment left level and log untouched
        assert_eq!(inventory.on_hand(&ctx, &product.id).await.unwrap(), 3);
        let rec = inventory.reconcile(&ctx, &product.id).await.unwrap();
        assert!(rec.consistent());
        assert_eq!(rec.on_hand, 3);
    }

    #[tokio::test]
    async fn test_adjust_rejections() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let tracked = testutil::product(&engine, 1, "ADJ-3", true).await;
        let untracked = testutil::product(&engine, 1, "SVC-1", false).await;
        let inventory = engine.inventory();

        assert!(matches!(
            inventory.adjust(&ctx, &tracked.id, 0, None).await,
            Err(EngineError::Validation(ValidationError::ZeroDelta))
        ));

        assert!(matches!(
            inventory.adjust(&ctx, &untracked.id, 5, None).await,
            Err(EngineError::Validation(
                ValidationError::NotStockTracked { .. }
            ))
        ));

        assert!(matches!(
            inventory.adjust(&ctx, "no-such-product", 5, None).await,
            Err(EngineError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_branches_are_separate_buckets() {
        let engine = testutil::engine().await;
        let product = testutil::product(&engine, 1, "ADJ-4", true).await;
        let inventory = engine.inventory();

        inventory
            .adjust(&testutil::ctx(1, 1), &product.id, 8, None)
            .await
            .unwrap();

        assert_eq!(
            inventory
                .on_hand(&testutil::ctx(1, 1), &product.id)
                .await
                .unwrap(),
            8
        );
        assert_eq!(
            inventory
                .on_hand(&testutil::ctx(1, 2), &product.id)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_movement_log_reconciles() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "ADJ-5", true).await;
        let inventory = engine.inventory();

        inventory.adjust(&ctx, &product.id, 12, None).await.unwrap();
        inventory.adjust(&ctx, &product.id, -2, None).await.unwrap();
        inventory.adjust(&ctx, &product.id, 5, None).await.unwrap();

        let rec = inventory.reconcile(&ctx, &product.id).await.unwrap();
        assert_eq!(rec.on_hand, 15);
        assert_eq!(rec.movement_sum, 15);
        assert!(rec.consistent());

        let movements = inventory.movements(&ctx, &product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 3);
        assert!(movements
            .iter()
            .all(|m| m.reason == MovementReason::Adjustment));
    }
}
