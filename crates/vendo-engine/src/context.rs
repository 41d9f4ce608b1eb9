//! # Tenant Context
//!
//! The scoping pair every engine call receives from the (excluded)
//! tenant/branch resolution layer. The engine treats both ids as opaque
//! keys; it only validates their ranges.

use serde::{Deserialize, Serialize};

use vendo_core::validation::validate_context;
use vendo_core::ValidationResult;

/// Tenant and branch scope for one engine call.
///
/// `tenant_id` is strictly positive. `branch_id` is zero or positive,
/// where 0 means unscoped/HQ; tenants with no branches configured operate
/// entirely in branch 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: i64,
    pub branch_id: i64,
}

impl TenantContext {
    /// Creates a context. Validation happens per call, not here, so a
    /// context can be built unconditionally from request data.
    pub fn new(tenant_id: i64, branch_id: i64) -> Self {
        TenantContext {
            tenant_id,
            branch_id,
        }
    }

    /// Validates the scoping ids.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_context(self.tenant_id, self.branch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TenantContext::new(1, 0).validate().is_ok());
        assert!(TenantContext::new(1, 4).validate().is_ok());
        assert!(TenantContext::new(0, 0).validate().is_err());
        assert!(TenantContext::new(-2, 0).validate().is_err());
        assert!(TenantContext::new(1, -1).validate().is_err());
    }
}
