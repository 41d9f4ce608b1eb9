//! # Validation Module
//!
//! Small input validators shared by the engine services.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE + cart pricing                                    │
//! │  ├── Context ids, quantities, references                                │
//! │  └── Rejected before any write (zero side effects)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  ├── UNIQUE constraints (invoice numbers, references)                   │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Defense in depth: the constraints catch what the validators miss       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_LINE_QUANTITY, MAX_REFERENCE_LEN};

/// Validates tenant and branch scoping ids.
///
/// Tenant ids are strictly positive; branch id 0 means unscoped/HQ and is
/// allowed everywhere a branch is accepted.
pub fn validate_context(tenant_id: i64, branch_id: i64) -> ValidationResult<()> {
    if tenant_id <= 0 {
        return Err(ValidationError::InvalidTenant { tenant_id });
    }
    if branch_id < 0 {
        return Err(ValidationError::InvalidBranch { branch_id });
    }
    Ok(())
}

/// Validates a document line quantity.
pub fn validate_quantity(product_id: &str, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity {
            product_id: product_id.to_string(),
        });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            product_id: product_id.to_string(),
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a caller-supplied document reference (e.g. an explicit
/// invoice number).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_REFERENCE_LEN`] characters
/// - Letters, digits, hyphens and slashes only
pub fn validate_reference(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, digits, hyphens and slashes".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_context() {
        assert!(validate_context(1, 0).is_ok());
        assert!(validate_context(7, 3).is_ok());
        assert!(matches!(
            validate_context(0, 0),
            Err(ValidationError::InvalidTenant { tenant_id: 0 })
        ));
        assert!(matches!(
            validate_context(1, -1),
            Err(ValidationError::InvalidBranch { branch_id: -1 })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("p1", 1).is_ok());
        assert!(validate_quantity("p1", MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity("p1", 0).is_err());
        assert!(validate_quantity("p1", -5).is_err());
        assert!(validate_quantity("p1", MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("invoice_no", "INV-2026-00042").is_ok());
        assert!(validate_reference("invoice_no", "A/123").is_ok());
        assert!(validate_reference("invoice_no", "").is_err());
        assert!(validate_reference("invoice_no", "   ").is_err());
        assert!(validate_reference("invoice_no", "bad ref").is_err());
        let long = "X".repeat(MAX_REFERENCE_LEN + 1);
        assert!(validate_reference("invoice_no", &long).is_err());
    }
}
