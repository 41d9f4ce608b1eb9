//! # Sale Transaction Composer
//!
//! Turns a validated cart into a committed sale: header, lines and the
//! corresponding stock decrements, all inside one transaction.
//!
//! ## Composition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SaleComposer::store(cart)                          │
//! │                                                                         │
//! │  1. price_cart()      pure validation + totals (vendo-core)             │
//! │  2. resolve products  pool reads: exist, active, stock_tracked flags    │
//! │  3. BEGIN                                                               │
//! │  4. invoice number    caller-supplied, or drawn from the sequence       │
//! │  5. insert header + one line per cart item                              │
//! │  6. inventory ledger  verify ALL aggregated demands, then decrement     │
//! │                       + movement per product (skips non-tracked)        │
//! │  7. COMMIT                                                              │
//! │                                                                         │
//! │  Any failure in 4-6 drops the transaction: no header, no lines, no      │
//! │  stock change is ever observable from a failed store().                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::info;

use vendo_core::cart::{aggregate_demand, price_cart, CartPayload};
use vendo_core::validation::validate_reference;
use vendo_core::{DocumentType, Product, Sale, SaleLine, SaleStatus};
use vendo_db::repository::sale::{generate_sale_id, generate_sale_line_id};
use vendo_db::Database;

use crate::context::TenantContext;
use crate::error::EngineResult;
use crate::inventory::InventoryLedger;
use crate::resolve_product;

/// What a successful `store` returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub id: String,
    pub invoice_no: String,
    pub branch_id: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub line_count: usize,
}

/// The sale composition service.
#[derive(Debug, Clone)]
pub struct SaleComposer {
    db: Database,
}

impl SaleComposer {
    /// Creates the service over a database handle.
    pub fn new(db: Database) -> Self {
        SaleComposer { db }
    }

    /// Validates the cart, computes totals and commits the sale with its
    /// stock decrements in one transaction.
    pub async fn store(
        &self,
        ctx: &TenantContext,
        payload: &CartPayload,
    ) -> EngineResult<SaleReceipt> {
        ctx.validate()?;
        let totals = price_cart(payload)?;
        if let Some(reference) = &payload.invoice_no {
            validate_reference("invoice_no", reference)?;
        }

        let caps = self.db.capabilities().await?;
        let stock_branch = caps.stock_branch(ctx.branch_id);

        // Resolve every distinct product once, in product-id order; the
        // aggregation also sums duplicate cart lines before the check
        let mut demands: Vec<(Product, i64)> = Vec::new();
        for (product_id, qty) in aggregate_demand(&payload.items) {
            let product = resolve_product(&self.db, ctx.tenant_id, &product_id).await?;
            demands.push((product, qty));
        }

        let now = Utc::now();
        let sale_date = payload.sale_date.unwrap_or_else(|| now.date_naive());
        let sale_id = generate_sale_id();

        let mut tx = self.db.pool().begin().await?;

        let invoice_no = match &payload.invoice_no {
            Some(explicit) => explicit.trim().to_string(),
            None => {
                self.db
                    .sequences()
                    .next_code(&mut tx, ctx.tenant_id, DocumentType::Invoice, sale_date.year())
                    .await?
            }
        };

        let sale = Sale {
            id: sale_id.clone(),
            tenant_id: ctx.tenant_id,
            branch_id: ctx.branch_id,
            invoice_no: invoice_no.clone(),
            customer_id: payload.customer_id.clone(),
            customer_name: payload.customer_name.clone(),
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            status: SaleStatus::Posted,
            notes: payload.notes.clone(),
            sale_date,
            created_at: now,
            updated_at: now,
        };

        let sales = self.db.sales();
        sales.insert_sale(&mut tx, &sale).await?;

        for item in &payload.items {
            let line = SaleLine {
                id: generate_sale_line_id(),
                sale_id: sale_id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.qty,
                unit_price_cents: item.price_cents,
                line_total_cents: item.line_total().cents(),
                created_at: now,
            };
            sales.insert_line(&mut tx, &line).await?;
        }

        InventoryLedger::new(self.db.clone())
            .decrement_for_sale(&mut tx, ctx.tenant_id, stock_branch, &demands, &sale_id)
            .await?;

        tx.commit().await?;

        info!(
            tenant_id = ctx.tenant_id,
            branch_id = ctx.branch_id,
            sale_id = %sale_id,
            invoice_no = %invoice_no,
            total_cents = totals.total.cents(),
            lines = payload.items.len(),
            "Sale committed"
        );

        Ok(SaleReceipt {
            id: sale_id,
            invoice_no,
            branch_id: ctx.branch_id,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            line_count: payload.items.len(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testutil;
    use vendo_core::cart::CartItem;
    use vendo_core::ValidationError;

    fn cart(items: Vec<CartItem>) -> CartPayload {
        CartPayload {
            items,
            // Pinned so invoice-number assertions don't depend on the clock
            sale_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 6),
            ..CartPayload::default()
        }
    }

    fn line(product_id: &str, qty: i64, price_cents: i64) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            qty,
            price_cents,
        }
    }

    #[tokio::test]
    async fn test_store_commits_header_lines_and_stock() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 1);
        let cola = testutil::product(&engine, 1, "COLA", true).await;
        let chips = testutil::product(&engine, 1, "CHIPS", true).await;
        testutil::fill_stock(&engine, &ctx, &cola.id, 20).await;
        testutil::fill_stock(&engine, &ctx, &chips.id, 20).await;

        let mut payload = cart(vec![line(&cola.id, 2, 10_000), line(&chips.id, 1, 5_000)]);
        payload.discount_percent = Some(10.0);
        payload.tax_percent = Some(5.0);

        let receipt = engine.sales().store(&ctx, &payload).await.unwrap();
        assert_eq!(receipt.subtotal_cents, 25_000);
        assert_eq!(receipt.discount_cents, 2_500);
        assert_eq!(receipt.tax_cents, 1_125);
        assert_eq!(receipt.total_cents, 23_625);
        assert_eq!(receipt.invoice_no, "INV-2026-00001");
        assert_eq!(receipt.branch_id, 1);

        // Header persisted with the totals invariant intact
        let sale = engine
            .db()
            .sales()
            .get_by_id(1, &receipt.id)
            .await
            .unwrap()
            .unwrap();
        assert!(sale.totals_consistent());
        assert_eq!(sale.status, SaleStatus::Posted);

        // Line totals reproduce the stored subtotal exactly
        let lines = engine.db().sales().get_lines(&receipt.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        let line_sum: i64 = lines.iter().map(|l| l.line_total_cents).sum();
        assert_eq!(line_sum, sale.subtotal_cents);

        // Stock decremented and movements linked to the sale
        let inventory = engine.inventory();
        assert_eq!(inventory.on_hand(&ctx, &cola.id).await.unwrap(), 18);
        assert_eq!(inventory.on_hand(&ctx, &chips.id).await.unwrap(), 19);
        let movements = inventory.movements(&ctx, &cola.id, 10).await.unwrap();
        assert_eq!(movements[0].source_id.as_deref(), Some(receipt.id.as_str()));
        assert!(inventory.reconcile(&ctx, &cola.id).await.unwrap().consistent());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 1);
        let product = testutil::product(&engine, 1, "SCARCE", true).await;
        testutil::fill_stock(&engine, &ctx, &product.id, 3).await;

        let payload = cart(vec![line(&product.id, 5, 1_000)]);
        let err = engine.sales().store(&ctx, &payload).await.unwrap_err();

        assert!(matches!(
            &err,
            EngineError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            }
        ));
        assert_eq!(
            err.client_message(),
            format!(
                "Insufficient stock for {}: available 3, requested 5",
                product.name
            )
        );

        // Zero side effects: stock untouched, no sale row, no extra movement
        assert_eq!(
            engine.inventory().on_hand(&ctx, &product.id).await.unwrap(),
            3
        );
        assert_eq!(
            engine
                .db()
                .sales()
                .count_by_status(1, SaleStatus::Posted)
                .await
                .unwrap(),
            0
        );
        let rec = engine.inventory().reconcile(&ctx, &product.id).await.unwrap();
        assert!(rec.consistent());
    }

    #[tokio::test]
    async fn test_rejection_is_all_or_nothing_across_lines() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let plenty = testutil::product(&engine, 1, "PLENTY", true).await;
        let scarce = testutil::product(&engine, 1, "SCARCE", true).await;
        testutil::fill_stock(&engine, &ctx, &plenty.id, 100).await;
        testutil::fill_stock(&engine, &ctx, &scarce.id, 1).await;

        // The abundant line comes first; it must still not commit
        let payload = cart(vec![line(&plenty.id, 10, 500), line(&scarce.id, 2, 500)]);
        engine.sales().store(&ctx, &payload).await.unwrap_err();

        assert_eq!(engine.inventory().on_hand(&ctx, &plenty.id).await.unwrap(), 100);
        assert_eq!(engine.inventory().on_hand(&ctx, &scarce.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_cart_lines_are_aggregated_before_the_check() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "AGG", true).await;
        testutil::fill_stock(&engine, &ctx, &product.id, 5).await;

        // 3 + 3 = 6 > 5: must fail even though each line alone would pass
        let payload = cart(vec![line(&product.id, 3, 100), line(&product.id, 3, 100)]);
        let err = engine.sales().store(&ctx, &payload).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        // 3 + 2 = 5: passes, stock reaches zero
        let payload = cart(vec![line(&product.id, 3, 100), line(&product.id, 2, 100)]);
        engine.sales().store(&ctx, &payload).await.unwrap();
        assert_eq!(engine.inventory().on_hand(&ctx, &product.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_tracked_products_skip_stock_entirely() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let service = testutil::product(&engine, 1, "DELIVERY", false).await;

        // No stock anywhere, yet the sale commits
        let payload = cart(vec![line(&service.id, 1, 2_500)]);
        let receipt = engine.sales().store(&ctx, &payload).await.unwrap();
        assert_eq!(receipt.total_cents, 2_500);

        // And no movement was recorded for it
        let movements = engine
            .inventory()
            .movements(&ctx, &service.id, 10)
            .await
            .unwrap();
        assert!(movements.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_products_are_rejected() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);

        let payload = cart(vec![line("ghost", 1, 100)]);
        assert!(matches!(
            engine.sales().store(&ctx, &payload).await,
            Err(EngineError::ProductNotFound(_))
        ));

        let product = testutil::product(&engine, 1, "GONE", true).await;
        {
            let mut tx = engine.db().pool().begin().await.unwrap();
            engine
                .db()
                .products()
                .deactivate(&mut tx, 1, &product.id)
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }
        let payload = cart(vec![line(&product.id, 1, 100)]);
        assert!(matches!(
            engine.sales().store(&ctx, &payload).await,
            Err(EngineError::ProductInactive(_))
        ));
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential_and_explicit_ones_must_be_unique() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "SEQ", true).await;
        testutil::fill_stock(&engine, &ctx, &product.id, 100).await;

        let a = engine
            .sales()
            .store(&ctx, &cart(vec![line(&product.id, 1, 100)]))
            .await
            .unwrap();
        let b = engine
            .sales()
            .store(&ctx, &cart(vec![line(&product.id, 1, 100)]))
            .await
            .unwrap();
        assert_eq!(a.invoice_no, "INV-2026-00001");
        assert_eq!(b.invoice_no, "INV-2026-00002");

        let mut payload = cart(vec![line(&product.id, 1, 100)]);
        payload.invoice_no = Some("MANUAL-1".to_string());
        engine.sales().store(&ctx, &payload).await.unwrap();

        // Same explicit number again: duplicate, rolled back whole
        let before = engine.inventory().on_hand(&ctx, &product.id).await.unwrap();
        let mut payload = cart(vec![line(&product.id, 1, 100)]);
        payload.invoice_no = Some("MANUAL-1".to_string());
        let err = engine.sales().store(&ctx, &payload).await.unwrap_err();
        assert!(matches!(err, EngineError::DuplicateReference { .. }));
        assert_eq!(
            engine.inventory().on_hand(&ctx, &product.id).await.unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn test_concurrent_sales_cannot_oversell() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let product = testutil::product(&engine, 1, "RACE", true).await;
        testutil::fill_stock(&engine, &ctx, &product.id, 5).await;

        // Combined demand 8 > 5: exactly one of the two may commit
        let payload_a = cart(vec![line(&product.id, 4, 100)]);
        let payload_b = cart(vec![line(&product.id, 4, 100)]);
        let sales = engine.sales();
        let (a, b) = tokio::join!(
            sales.store(&ctx, &payload_a),
            sales.store(&ctx, &payload_b),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a } else { b };
        assert!(matches!(
            failure.unwrap_err(),
            EngineError::InsufficientStock { .. }
        ));

        assert_eq!(engine.inventory().on_hand(&ctx, &product.id).await.unwrap(), 1);
        assert!(engine
            .inventory()
            .reconcile(&ctx, &product.id)
            .await
            .unwrap()
            .consistent());
    }

    #[tokio::test]
    async fn test_validation_failures_reject_before_any_write() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);

        assert!(matches!(
            engine.sales().store(&ctx, &cart(vec![])).await,
            Err(EngineError::Validation(ValidationError::EmptyCart))
        ));

        assert!(matches!(
            engine.sales().store(&ctx, &cart(vec![line("p", 1, 0)])).await,
            Err(EngineError::Validation(ValidationError::ZeroSubtotal))
        ));

        let bad_ctx = testutil::ctx(0, 0);
        assert!(matches!(
            engine.sales().store(&bad_ctx, &cart(vec![line("p", 1, 100)])).await,
            Err(EngineError::Validation(ValidationError::InvalidTenant { .. }))
        ));

        // Nothing was drawn from the invoice sequence by any of these
        assert_eq!(
            engine
                .db()
                .sequences()
                .current(1, DocumentType::Invoice, 2026)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_receipt_serializes_for_the_http_boundary() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 2);
        let product = testutil::product(&engine, 1, "JSON", true).await;
        testutil::fill_stock(&engine, &ctx, &product.id, 10).await;

        let receipt = engine
            .sales()
            .store(&ctx, &cart(vec![line(&product.id, 1, 999)]))
            .await
            .unwrap();

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["branch_id"], 2);
        assert_eq!(json["total_cents"], 999);
        assert!(json["invoice_no"].as_str().unwrap().starts_with("INV-"));
    }
}
