//! # Money Module
//!
//! Monetary values in integer minor currency units, plus the `Rate` type
//! for percentage math (discounts, tax).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004   WRONG for money                    │
//! │                                                                         │
//! │  The source system mixed decimal headers with integer line amounts,     │
//! │  which is how rounding drift creeps into totals.                        │
//! │                                                                         │
//! │  OUR SOLUTION: minor units (cents) everywhere                           │
//! │    Headers, lines, stock valuations and journal amounts all carry       │
//! │    i64 cents. Decimal only exists at the presentation boundary.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vendo_core::money::{Money, Rate};
//!
//! let subtotal = Money::from_cents(25_000);           // 250.00
//! let discount = subtotal.percentage(Rate::from_percent(10.0)); // 25.00
//! let tax_base = subtotal - discount;                 // 225.00
//! let tax = tax_base.percentage(Rate::from_percent(5.0));       // 11.25
//! assert_eq!((tax_base + tax).cents(), 23_625);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and corrections can be negative in
///   intermediate math even though persisted documents never are
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Transparent serde**: serializes as a bare integer, matching the
///   `_cents` columns in the database
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (cents).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps the value into `[lo, hi]`.
    ///
    /// Used when resolving an explicit discount amount: a negative input is
    /// raised to zero and a discount larger than the subtotal is capped, so
    /// `total = subtotal - discount + tax` always holds with a non-negative
    /// tax base.
    #[inline]
    pub fn clamp(&self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }

    /// Applies a percentage `Rate` to this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math in i128 to rule out overflow on large amounts:
    /// `(amount_cents * bps + 5000) / 10000`. The `+5000` provides the
    /// half-up rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use vendo_core::money::{Money, Rate};
    ///
    /// // 225.00 at 5% = 11.25 exactly
    /// let tax = Money::from_cents(22_500).percentage(Rate::from_percent(5.0));
    /// assert_eq!(tax.cents(), 1_125);
    ///
    /// // 10.00 at 8.25% = 0.825, rounds to 0.83
    /// let tax = Money::from_cents(1_000).percentage(Rate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(cents as i64)
    }

    /// Multiplies by a quantity, producing a line total.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Debug/log formatting in major.minor form. Currency symbols and locale
/// formatting belong to the presentation boundary, not here.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage expressed in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. 825 bps = 8.25%. Callers supply
/// percentages as decimals ("10" means 10%) at the boundary; internally
/// everything is integer bps so percentage math stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage ("10.0" means 10%).
    ///
    /// The caller validates sign; a negative input saturates to zero.
    pub fn from_percent(pct: f64) -> Self {
        if pct <= 0.0 {
            return Rate(0);
        }
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
