//! # Engine Error Types
//!
//! What callers of the engine see.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation        → rejected before any write, zero side effects       │
//! │  InsufficientStock → whole transaction rolled back, names the product   │
//! │  DuplicateReference→ caller supplied an already-used document code      │
//! │  Busy              → lock wait timed out; retryable, nothing committed  │
//! │  Configuration     → core tables unusable; fatal for the operation      │
//! │  Db                → anything else from storage; detail stays in logs   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `client_message()` is the safely-worded string for the outside world:
//! known, harmless causes are spelled out ("Insufficient stock for X");
//! internal failures collapse to a generic message while the full error is
//! logged where it occurred.

use thiserror::Error;

use vendo_core::{Product, ValidationError};
use vendo_db::DbError;

/// Errors surfaced by the engine services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A stock-tracked product cannot cover the requested quantity. The
    /// surrounding transaction was rolled back; no partial decrement is
    /// ever observable.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Referenced product does not exist for this tenant.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Referenced product exists but is deactivated.
    #[error("Product is inactive: {0}")]
    ProductInactive(String),

    /// A caller-supplied document code collides with an existing one.
    #[error("Duplicate document reference: {value}")]
    DuplicateReference { value: String },

    /// The engine cannot operate without its core tables. Note that
    /// missing *ledger* tables are not this error: the poster degrades to
    /// a skip instead.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lock wait timed out on a contended row. Nothing was committed;
    /// resubmit.
    #[error("Operation timed out waiting on a locked record, please retry")]
    Busy,

    /// Storage failure. Full detail is for logs, not for callers.
    #[error("Database error: {0}")]
    Db(DbError),
}

impl EngineError {
    /// Builds the insufficient-stock error from the resolved product, so
    /// the message names something a human recognizes.
    pub(crate) fn insufficient(product: &Product, available: i64, requested: i64) -> Self {
        EngineError::InsufficientStock {
            product: product.name.clone(),
            available,
            requested,
        }
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Busy)
            || matches!(self, EngineError::Db(e) if e.is_retryable())
    }

    /// The safely-worded message for external callers. Known causes are
    /// disclosed; internal failures are collapsed to a generic message.
    pub fn client_message(&self) -> String {
        match self {
            EngineError::Validation(_)
            | EngineError::InsufficientStock { .. }
            | EngineError::ProductNotFound(_)
            | EngineError::ProductInactive(_)
            | EngineError::DuplicateReference { .. }
            | EngineError::Busy => self.to_string(),
            EngineError::Configuration(_) | EngineError::Db(_) => {
                "The operation could not be completed; nothing was saved".to_string()
            }
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy => EngineError::Busy,
            DbError::UniqueViolation { field, value } => EngineError::DuplicateReference {
                value: if value == "unknown" { field } else { value },
            },
            other => EngineError::Db(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
