//! # Stock Transfer Coordinator
//!
//! Moves quantity between two branches with the same verify-then-mutate
//! discipline as the sale path: the availability check is scoped to the
//! source branch only, the destination is credited unconditionally once
//! the source check passes, and any failing line aborts the whole
//! transfer with both branches untouched.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use vendo_core::cart::aggregate_demand;
use vendo_core::validation::{validate_quantity, validate_reference};
use vendo_core::{CartItem, DocumentType, Product, StockTransfer, TransferLine, ValidationError};
use vendo_db::repository::transfer::{generate_transfer_id, generate_transfer_line_id};
use vendo_db::Database;

use crate::context::TenantContext;
use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryLedger;
use crate::resolve_product;
use crate::MAX_CART_LINES;

/// One requested transfer line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLineRequest {
    pub product_id: String,
    pub qty: i64,
}

/// A transfer request as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_branch_id: i64,
    pub to_branch_id: i64,
    #[serde(default)]
    pub transfer_date: Option<NaiveDate>,
    /// Explicit reference; when absent one is drawn from the sequence.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub lines: Vec<TransferLineRequest>,
}

/// What a successful transfer returns.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub id: String,
    pub reference: String,
    pub from_branch_id: i64,
    pub to_branch_id: i64,
    pub line_count: usize,
}

/// The transfer coordination service.
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    db: Database,
}

impl TransferCoordinator {
    /// Creates the service over a database handle.
    pub fn new(db: Database) -> Self {
        TransferCoordinator { db }
    }

    /// Applies a transfer between two branches in one transaction.
    pub async fn transfer(
        &self,
        ctx: &TenantContext,
        request: &TransferRequest,
    ) -> EngineResult<TransferReceipt> {
        ctx.validate()?;
        if request.from_branch_id < 0 {
            return Err(ValidationError::InvalidBranch {
                branch_id: request.from_branch_id,
            }
            .into());
        }
        if request.to_branch_id < 0 {
            return Err(ValidationError::InvalidBranch {
                branch_id: request.to_branch_id,
            }
            .into());
        }
        if request.lines.is_empty() {
            return Err(ValidationError::EmptyTransfer.into());
        }
        if request.lines.len() > MAX_CART_LINES {
            return Err(ValidationError::TooLong {
                field: "lines".to_string(),
                max: MAX_CART_LINES,
            }
            .into());
        }
        for line in &request.lines {
            validate_quantity(&line.product_id, line.qty)?;
        }
        if let Some(reference) = &request.reference {
            validate_reference("reference", reference)?;
        }

        let caps = self.db.capabilities().await?;
        let from_branch = caps.stock_branch(request.from_branch_id);
        let to_branch = caps.stock_branch(request.to_branch_id);
        if from_branch == to_branch {
            // Also covers unscoped-stock deployments where every branch
            // collapses onto 0: there is nothing to move between buckets
            return Err(ValidationError::SameBranch {
                branch_id: from_branch,
            }
            .into());
        }

        // Aggregate duplicate product lines before checking, same as the
        // sale path, and resolve products in product-id order
        let demand_items: Vec<CartItem> = request
            .lines
            .iter()
            .map(|l| CartItem {
                product_id: l.product_id.clone(),
                qty: l.qty,
                price_cents: 0,
            })
            .collect();
        let mut demands: Vec<(Product, i64)> = Vec::new();
        for (product_id, qty) in aggregate_demand(&demand_items) {
            let product = resolve_product(&self.db, ctx.tenant_id, &product_id).await?;
            demands.push((product, qty));
        }

        let now = Utc::now();
        let transfer_date = request.transfer_date.unwrap_or_else(|| now.date_naive());
        let transfer_id = generate_transfer_id();

        let stock = self.db.stock();
        let transfers = self.db.transfers();
        let mut tx = self.db.pool().begin().await?;

        let reference = match &request.reference {
            Some(explicit) => explicit.trim().to_string(),
            None => {
                self.db
                    .sequences()
                    .next_code(
                        &mut tx,
                        ctx.tenant_id,
                        DocumentType::Transfer,
                        transfer_date.year(),
                    )
                    .await?
            }
        };

        transfers
            .insert_transfer(
                &mut tx,
                &StockTransfer {
                    id: transfer_id.clone(),
                    tenant_id: ctx.tenant_id,
                    from_branch_id: from_branch,
                    to_branch_id: to_branch,
                    reference: reference.clone(),
                    transfer_date,
                    notes: request.notes.clone(),
                    created_at: now,
                },
            )
            .await?;

        for line in &request.lines {
            transfers
                .insert_line(
                    &mut tx,
                    &TransferLine {
                        id: generate_transfer_line_id(),
                        transfer_id: transfer_id.clone(),
                        product_id: line.product_id.clone(),
                        quantity: line.qty,
                    },
                )
                .await?;
        }

        // Phase 1: verify every tracked demand at the source branch
        for (product, qty) in demands.iter().filter(|(p, _)| p.stock_tracked) {
            let available = stock
                .quantity(&mut tx, ctx.tenant_id, from_branch, &product.id)
                .await?;
            if available < *qty {
                return Err(EngineError::insufficient(product, available, *qty));
            }
        }

        // Phase 2: debit source, credit destination, movement per side
        let inventory = InventoryLedger::new(self.db.clone());
        for (product, qty) in demands.iter().filter(|(p, _)| p.stock_tracked) {
            inventory
                .apply_transfer_line(
                    &mut tx,
                    ctx.tenant_id,
                    from_branch,
                    to_branch,
                    product,
                    *qty,
                    &transfer_id,
                )
                .await?;
        }

        tx.commit().await?;

        info!(
            tenant_id = ctx.tenant_id,
            transfer_id = %transfer_id,
            reference = %reference,
            from_branch,
            to_branch,
            lines = request.lines.len(),
            "Stock transfer committed"
        );

        Ok(TransferReceipt {
            id: transfer_id,
            reference,
            from_branch_id: from_branch,
            to_branch_id: to_branch,
            line_count: request.lines.len(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
