//! # Error Types
//!
//! Domain-level error types for vendo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Layers                                    │
//! │                                                                         │
//! │  vendo-core (this file)                                                 │
//! │  └── ValidationError  - rejected before any write                       │
//! │                                                                         │
//! │  vendo-db                                                               │
//! │  └── DbError          - storage failures, lock contention               │
//! │                                                                         │
//! │  vendo-engine                                                           │
//! │  └── EngineError      - what callers see (safe client messages)         │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → caller                           │
//! │        DbError         → EngineError → caller                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive, never manual Display impls
//! 2. Errors carry the offending value (product id, field name)
//! 3. Errors are enum variants, never bare Strings

use thiserror::Error;

/// Input validation failures. Raised before any write happens, so a
/// validation error never has side effects to roll back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Every line priced out to zero.
    #[error("Cart subtotal must be greater than zero")]
    ZeroSubtotal,

    /// A line quantity is zero or negative.
    #[error("Quantity for product {product_id} must be positive")]
    NonPositiveQuantity { product_id: String },

    /// A line quantity exceeds the per-line ceiling.
    #[error("Quantity for product {product_id} exceeds maximum allowed ({max})")]
    QuantityTooLarge { product_id: String, max: i64 },

    /// A line carries a negative unit price.
    #[error("Unit price for product {product_id} must not be negative")]
    NegativeUnitPrice { product_id: String },

    /// A percentage input (tax, discount) is negative.
    #[error("{field} must not be negative")]
    NegativeRate { field: String },

    /// A monetary amount that must be positive is not.
    #[error("{field} must be greater than zero")]
    NonPositiveAmount { field: String },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (bad reference code, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Tenant ids must be positive.
    #[error("Invalid tenant id: {tenant_id}")]
    InvalidTenant { tenant_id: i64 },

    /// Branch ids must be zero or positive.
    #[error("Invalid branch id: {branch_id}")]
    InvalidBranch { branch_id: i64 },

    /// Transfers need two distinct branches.
    #[error("Transfer source and destination branch are the same ({branch_id})")]
    SameBranch { branch_id: i64 },

    /// A transfer has no lines.
    #[error("Transfer has no lines")]
    EmptyTransfer,

    /// A stock adjustment with delta zero is meaningless.
    #[error("Stock adjustment delta must not be zero")]
    ZeroDelta,

    /// Direct stock operations require a stock-tracked product.
    #[error("Product {product_id} is not stock-tracked")]
    NotStockTracked { product_id: String },

    /// A posting that debits and credits the same account is not a posting.
    #[error("Debit and credit account must differ ({account_id})")]
    SelfPosting { account_id: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::NonPositiveQuantity {
            product_id: "p-42".to_string(),
        };
        assert_eq!(err.to_string(), "Quantity for product p-42 must be positive");

        let err = ValidationError::SameBranch { branch_id: 3 };
        assert_eq!(
            err.to_string(),
            "Transfer source and destination branch are the same (3)"
        );
    }
}
