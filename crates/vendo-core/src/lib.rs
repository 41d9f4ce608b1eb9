//! # vendo-core: Pure Business Logic for the Vendo Commerce Engine
//!
//! This crate is the heart of the engine: cart pricing, money math and the
//! domain model, all as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendo Architecture                               │
//! │                                                                         │
//! │  Caller (HTTP layer, excluded) submits a cart payload                   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    vendo-engine (services)                      │    │
//! │  │   SaleComposer, InventoryLedger, TransferCoordinator,           │    │
//! │  │   LedgerPoster, reference numbering                             │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ vendo-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│    │    │
//! │  │   │ Sale, ... │  │Money, Rate│  │  pricing  │  │   rules   │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    vendo-db (storage layer)                     │    │
//! │  │              SQLite queries, migrations, repositories           │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; nothing here touches I/O
//! 2. **Integer Money**: all monetary values are i64 minor units
//! 3. **Explicit Errors**: typed enums, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{aggregate_demand, price_cart, CartItem, CartPayload, CartTotals};
pub use error::{ValidationError, ValidationResult};
pub use money::{Money, Rate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart or transfer.
///
/// ## Business Reason
/// Bounds transaction size (and therefore write-lock hold time) per
/// document. Can be made configurable per tenant later.
pub const MAX_CART_LINES: usize = 200;

/// Maximum quantity on a single document line.
///
/// ## Business Reason
/// Catches fat-finger entries (9999 instead of 9) before they hit stock.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum length of a caller-supplied document reference.
pub const MAX_REFERENCE_LEN: usize = 40;
