//! # Domain Types
//!
//! Core domain types for the Vendo commerce engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Selling                 Inventory               Accounting             │
//! │  ┌──────────────┐        ┌──────────────┐        ┌──────────────┐       │
//! │  │ Sale         │        │ StockLevel   │        │ Journal      │       │
//! │  │ SaleLine     │        │ StockMovement│        │ JournalEntry │       │
//! │  │ SaleStatus   │        │ StockTransfer│        │ Account      │       │
//! │  └──────────────┘        │ TransferLine │        └──────────────┘       │
//! │                          └──────────────┘                               │
//! │  Source documents for posting: Expense, Payment                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity & Scoping
//! - Entity primary keys are UUID v4 strings, generated by the storage layer.
//! - `tenant_id` (i64 > 0) scopes every entity; `branch_id` (i64 >= 0)
//!   scopes inventory and cash operations, with 0 meaning unscoped/HQ.
//! - Every monetary column is an i64 in minor currency units (`_cents`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A sellable product. The engine only reads products; product CRUD is an
/// external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: i64,

    /// Stock Keeping Unit - business identifier, unique per tenant.
    pub sku: String,

    /// Display name shown on documents and in error messages.
    pub name: String,

    /// Whether stock-level checks and mutations apply to this product.
    /// Non-tracked products (services, fees) bypass the inventory ledger.
    pub stock_tracked: bool,

    /// Whether the product may appear on new documents (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// The status of a sale document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Committed: totals final, stock decremented.
    Posted,
    /// Parked for later completion; no stock effect yet.
    Hold,
    /// Cancelled after posting.
    Void,
    /// Fully refunded after posting.
    Refunded,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Posted
    }
}

/// A sale header. Created together with its lines and the corresponding
/// stock decrements in one transaction; append-only once posted.
///
/// Invariant: `total_cents = subtotal_cents - discount_cents + tax_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: i64,
    pub branch_id: i64,
    /// Human-readable document code, unique per tenant (`INV-YYYY-NNNNN`).
    pub invoice_no: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks the header totals invariant.
    pub fn totals_consistent(&self) -> bool {
        self.total_cents == self.subtotal_cents - self.discount_cents + self.tax_cents
    }
}

/// A sale line. Owned exclusively by one sale.
///
/// Invariant: `line_total_cents = quantity * unit_price_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand quantity for one (tenant, branch, product) triple.
/// Mutated only through the inventory ledger's verify-then-mutate path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub tenant_id: i64,
    pub branch_id: i64,
    pub product_id: String,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

/// Why a stock movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// Decrement caused by a committed sale.
    Sale,
    /// Manual correction on the stock ledger.
    Adjustment,
    /// Debit side of an inter-branch transfer.
    TransferOut,
    /// Credit side of an inter-branch transfer.
    TransferIn,
}

/// Immutable, append-only record of one StockLevel mutation. The signed sum
/// of movements for a product must equal its current StockLevel quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: i64,
    pub branch_id: i64,
    pub product_id: String,
    pub direction: MovementDirection,
    /// Always positive; `direction` carries the sign.
    pub quantity: i64,
    pub reason: MovementReason,
    /// Linked sale or transfer id, when the movement came from a document.
    pub source_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed quantity: positive for `in`, negative for `out`.
    pub fn signed_quantity(&self) -> i64 {
        match self.direction {
            MovementDirection::In => self.quantity,
            MovementDirection::Out => -self.quantity,
        }
    }
}

/// A stock transfer header. A transfer either fully applies (source
/// decremented, destination credited) or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockTransfer {
    pub id: String,
    pub tenant_id: i64,
    pub from_branch_id: i64,
    pub to_branch_id: i64,
    /// `TRF-YYYY-NNNNN`, unique per tenant.
    pub reference: String,
    pub transfer_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One product line on a stock transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransferLine {
    pub id: String,
    pub transfer_id: String,
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Accounting
// =============================================================================

/// Ledger account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

/// A ledger account. Account CRUD is an external collaborator; the poster
/// only resolves accounts by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: String,
    pub tenant_id: i64,
    /// Business code, unique per tenant (e.g. "1000").
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A journal header. Created once at posting time, never mutated.
///
/// Invariant over its entries: sum(debit) == sum(credit).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Journal {
    pub id: String,
    pub tenant_id: i64,
    pub journal_date: NaiveDate,
    /// `JRN-YYYY-NNNNN`, unique per tenant.
    pub reference: String,
    pub memo: Option<String>,
    /// Source document back-link: table discriminant + row id.
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One side of a journal. Exactly one of debit/credit is nonzero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct JournalEntry {
    pub id: String,
    pub journal_id: String,
    pub account_id: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
}

impl JournalEntry {
    /// Exactly one side carries an amount, and it is positive.
    pub fn is_well_formed(&self) -> bool {
        (self.debit_cents > 0 && self.credit_cents == 0)
            || (self.credit_cents > 0 && self.debit_cents == 0)
    }
}

// =============================================================================
// Source documents
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
}

/// An expense record. The poster writes `journal_id` / `posted_at` back
/// onto it after a successful posting (one-way link, not FK-enforced).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub tenant_id: i64,
    pub branch_id: i64,
    pub expense_date: NaiveDate,
    pub amount_cents: i64,
    pub memo: Option<String>,
    /// `EXP-YYYY-NNNNN`, unique per tenant.
    pub reference: String,
    pub journal_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A payment record (customer receipt or supplier payment). Same one-way
/// journal back-link as [`Expense`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub tenant_id: i64,
    pub branch_id: i64,
    pub sale_id: Option<String>,
    pub payment_date: NaiveDate,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// `PAY-YYYY-NNNNN`, unique per tenant.
    pub reference: String,
    pub journal_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Document numbering
// =============================================================================

/// The document families that draw from per-(tenant, type, year) reference
/// sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Expense,
    Payment,
    Transfer,
    Journal,
}

impl DocumentType {
    /// Stable discriminant stored in the `reference_sequences` table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Expense => "expense",
            DocumentType::Payment => "payment",
            DocumentType::Transfer => "transfer",
            DocumentType::Journal => "journal",
        }
    }

    /// Human-readable code prefix.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INV",
            DocumentType::Expense => "EXP",
            DocumentType::Payment => "PAY",
            DocumentType::Transfer => "TRF",
            DocumentType::Journal => "JRN",
        }
    }

    /// Formats a document code: `PREFIX-YYYY-NNNNN`.
    pub fn format_code(&self, year: i32, number: i64) -> String {
        format!("{}-{}-{:05}", self.prefix(), year, number)
    }
}

/// Which table a journal posting links back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDocument {
    Expense,
    Payment,
}

impl SourceDocument {
    /// Discriminant stored on the journal header.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SourceDocument::Expense => "expense",
            SourceDocument::Payment => "payment",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_document_code_format() {
        assert_eq!(
            DocumentType::Invoice.format_code(2026, 1),
            "INV-2026-00001"
        );
        assert_eq!(
            DocumentType::Transfer.format_code(2026, 12345),
            "TRF-2026-12345"
        );
        // Six digits are allowed once the five-digit space is exhausted;
        // zero-padding only guarantees a minimum width
        assert_eq!(
            DocumentType::Journal.format_code(2027, 123456),
            "JRN-2027-123456"
        );
    }

    #[test]
    fn test_movement_signed_quantity() {
        let now = Utc::now();
        let movement = StockMovement {
            id: "m1".into(),
            tenant_id: 1,
            branch_id: 1,
            product_id: "p1".into(),
            direction: MovementDirection::Out,
            quantity: 4,
            reason: MovementReason::Sale,
            source_id: Some("s1".into()),
            note: None,
            created_at: now,
        };
        assert_eq!(movement.signed_quantity(), -4);
    }

    #[test]
    fn test_journal_entry_well_formed() {
        let debit = JournalEntry {
            id: "e1".into(),
            journal_id: "j1".into(),
            account_id: "a1".into(),
            debit_cents: 500_00,
            credit_cents: 0,
        };
        assert!(debit.is_well_formed());

        let both_sides = JournalEntry {
            debit_cents: 100,
            credit_cents: 100,
            ..debit.clone()
        };
        assert!(!both_sides.is_well_formed());

        let empty = JournalEntry {
            debit_cents: 0,
            credit_cents: 0,
            ..debit
        };
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn test_sale_totals_consistent() {
        let now = Utc::now();
        let sale = Sale {
            id: "s1".into(),
            tenant_id: 1,
            branch_id: 0,
            invoice_no: "INV-2026-00001".into(),
            customer_id: None,
            customer_name: None,
            subtotal_cents: 25_000,
            discount_cents: 2_500,
            tax_cents: 1_125,
            total_cents: 23_625,
            status: SaleStatus::Posted,
            notes: None,
            sale_date: now.date_naive(),
            created_at: now,
            updated_at: now,
        };
        assert!(sale.totals_consistent());
    }

    #[test]
    fn test_status_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&SaleStatus::Posted).unwrap(),
            "\"posted\""
        );
        assert_eq!(
            serde_json::to_string(&MovementReason::TransferOut).unwrap(),
            "\"transfer_out\""
        );
    }
}
