//! # Cart Pricing
//!
//! Pure cart validation and pricing: the math half of the sale composer.
//! Everything in this module runs before any database work, so a rejected
//! cart never has side effects.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       price_cart(payload)                               │
//! │                                                                         │
//! │  items ──► validate (non-empty, qty > 0, price >= 0)                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  subtotal = Σ qty × unit_price            (must be > 0)                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  discount: percent > 0 overrides amount; result clamped to             │
//! │            [0, subtotal] so the tax base never goes negative            │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  tax = rate × (subtotal − discount)                                     │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  total = subtotal − discount + tax        (header invariant)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::money::{Money, Rate};
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

// =============================================================================
// Payload
// =============================================================================

/// One cart line as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub qty: i64,
    /// Unit price in minor currency units. Accepts the legacy `price`
    /// field name on the wire.
    #[serde(alias = "price")]
    pub price_cents: i64,
}

impl CartItem {
    /// Line total before any document-level discount.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.qty)
    }
}

/// The cart payload accepted by `SaleComposer::store`.
///
/// Percentages are plain decimals ("10" means 10%); they are converted to
/// basis points internally. A supplied `discount_percent > 0` overrides
/// `discount_cents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartPayload {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Explicit discount in minor units. Accepts the legacy
    /// `discount_amount` field name on the wire.
    #[serde(default, alias = "discount_amount")]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub tax_percent: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    /// Explicit invoice number; when absent one is drawn from the
    /// reference sequence.
    #[serde(default)]
    pub invoice_no: Option<String>,
}

// =============================================================================
// Totals
// =============================================================================

/// The four header amounts of a priced cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl CartTotals {
    /// The amount tax was computed on.
    #[inline]
    pub fn tax_base(&self) -> Money {
        self.subtotal - self.discount
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Validates a cart payload and computes its totals.
///
/// ## Rules
/// - cart non-empty, at most [`MAX_CART_LINES`] lines
/// - every quantity positive, every unit price non-negative
/// - subtotal strictly positive
/// - discount: `discount_percent > 0` overrides the explicit amount;
///   either way the result is clamped to `[0, subtotal]`
/// - tax applies to the discounted base; negative percentages are rejected
pub fn price_cart(payload: &CartPayload) -> ValidationResult<CartTotals> {
    if payload.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    if payload.items.len() > MAX_CART_LINES {
        return Err(ValidationError::TooLong {
            field: "items".to_string(),
            max: MAX_CART_LINES,
        });
    }

    let mut subtotal = Money::zero();
    for item in &payload.items {
        validate_quantity(&item.product_id, item.qty)?;
        if item.price_cents < 0 {
            return Err(ValidationError::NegativeUnitPrice {
                product_id: item.product_id.clone(),
            });
        }
        subtotal += item.line_total();
    }

    if !subtotal.is_positive() {
        return Err(ValidationError::ZeroSubtotal);
    }

    if matches!(payload.tax_percent, Some(p) if p < 0.0) {
        return Err(ValidationError::NegativeRate {
            field: "tax_percent".to_string(),
        });
    }
    if matches!(payload.discount_percent, Some(p) if p < 0.0) {
        return Err(ValidationError::NegativeRate {
            field: "discount_percent".to_string(),
        });
    }

    let discount = match payload.discount_percent {
        Some(pct) if pct > 0.0 => subtotal.percentage(Rate::from_percent(pct)),
        _ => Money::from_cents(payload.discount_cents.unwrap_or(0)),
    }
    .clamp(Money::zero(), subtotal);

    let tax_rate = Rate::from_percent(payload.tax_percent.unwrap_or(0.0));
    let tax_base = subtotal - discount;
    let tax = tax_base.percentage(tax_rate);

    Ok(CartTotals {
        subtotal,
        discount,
        tax,
        total: tax_base + tax,
    })
}

/// Aggregates cart lines into per-product demand, summing duplicate
/// products before any stock check happens.
///
/// Returns a `BTreeMap` so callers iterate demands in product-id order;
/// that deterministic order is what keeps two overlapping multi-product
/// operations from locking rows in conflicting orders.
pub fn aggregate_demand(items: &[CartItem]) -> BTreeMap<String, i64> {
    let mut demand: BTreeMap<String, i64> = BTreeMap::new();
    for item in items {
        *demand.entry(item.product_id.clone()).or_insert(0) += item.qty;
    }
    demand
}

// =============================================================================
// Unit Tests
// =============================================================================
