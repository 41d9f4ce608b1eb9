//! # vendo-engine: Transactional Commerce Services
//!
//! The part of the retail back-office with real invariants to protect:
//! non-negative stock, balanced debits and credits, collision-free
//! document numbers, and the guarantee that a failed operation leaves no
//! partial writes behind.
//!
//! ## Services
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          vendo-engine                                   │
//! │                                                                         │
//! │  cart payload ──► SaleComposer::store                                   │
//! │                     ├── price_cart (vendo-core, pure)                   │
//! │                     ├── invoice number (atomic sequence)                │
//! │                     ├── header + lines                                  │
//! │                     └── InventoryLedger::decrement_for_sale             │
//! │                            verify ALL → mutate → movement log           │
//! │                                                                         │
//! │  transfer req ──► TransferCoordinator::transfer                         │
//! │                     └── source-side check, symmetric debit/credit       │
//! │                                                                         │
//! │  money event ──► LedgerPoster::post                                     │
//! │                     └── balanced 2-entry journal + source back-link,    │
//! │                         skipped (not failed) when ledger is absent      │
//! │                                                                         │
//! │  ONE transaction per operation. Any error rolls the whole document      │
//! │  back; partial writes are never observable.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//! Synchronous request-scoped transactions on a shared SQLite store (WAL).
//! Writers serialize; a contended operation waits at most the configured
//! busy timeout, then surfaces the retryable [`EngineError::Busy`]. Stock
//! demands are always aggregated and applied in product-id order so
//! overlapping multi-product operations cannot order-deadlock, and every
//! decrement is guarded (`quantity >= ?`) so interleavings can never drive
//! a tracked product negative.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod composer;
pub mod context;
pub mod error;
pub mod inventory;
pub mod posting;
pub mod transfer;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use composer::{SaleComposer, SaleReceipt};
pub use context::TenantContext;
pub use error::{EngineError, EngineResult};
pub use inventory::{InventoryLedger, Reconciliation};
pub use posting::{LedgerPoster, PostedJournal, PostingRequest};
pub use transfer::{TransferCoordinator, TransferReceipt, TransferRequest};

pub use vendo_core::cart::{CartItem, CartPayload, CartTotals};
pub use vendo_core::MAX_CART_LINES;
pub use vendo_db::{Database, DbConfig};

use vendo_core::Product;

/// Entry point bundling the services over one database handle.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./vendo.db")).await?;
/// let engine = Engine::new(db);
///
/// let ctx = TenantContext::new(tenant_id, branch_id);
/// let receipt = engine.sales().store(&ctx, &cart).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
}

impl Engine {
    /// Creates the engine over a database handle.
    pub fn new(db: Database) -> Self {
        Engine { db }
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The inventory ledger service.
    pub fn inventory(&self) -> InventoryLedger {
        InventoryLedger::new(self.db.clone())
    }

    /// The sale composition service.
    pub fn sales(&self) -> SaleComposer {
        SaleComposer::new(self.db.clone())
    }

    /// The stock transfer coordination service.
    pub fn transfers(&self) -> TransferCoordinator {
        TransferCoordinator::new(self.db.clone())
    }

    /// The double-entry posting service.
    pub fn ledger(&self) -> LedgerPoster {
        LedgerPoster::new(self.db.clone())
    }
}

/// Resolves a product for a tenant: it must exist and be active.
pub(crate) async fn resolve_product(
    db: &Database,
    tenant_id: i64,
    product_id: &str,
) -> EngineResult<Product> {
    let product = db
        .products()
        .get_by_id(tenant_id, product_id)
        .await?
        .ok_or_else(|| EngineError::ProductNotFound(product_id.to_string()))?;

    if !product.is_active {
        return Err(EngineError::ProductInactive(product.name.clone()));
    }

    Ok(product)
}

// =============================================================================
// Test Support
// =============================================================================
