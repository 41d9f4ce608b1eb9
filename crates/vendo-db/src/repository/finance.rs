//! # Finance Repository
//!
//! Source documents for ledger posting: expenses and payments. Their CRUD
//! screens are external collaborators; the engine needs them for the
//! poster's one-way journal back-link (and seeding/tests need inserts).

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendo_core::{Expense, Payment, SourceDocument};

const EXPENSE_COLUMNS: &str = "id, tenant_id, branch_id, expense_date, amount_cents, memo, \
     reference, journal_id, posted_at, created_at";

const PAYMENT_COLUMNS: &str = "id, tenant_id, branch_id, sale_id, payment_date, amount_cents, \
     method, reference, journal_id, posted_at, created_at";

/// Repository for expense and payment documents.
#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
}

impl FinanceRepository {
    /// Creates a new FinanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FinanceRepository { pool }
    }

    /// Inserts an expense document.
    pub async fn insert_expense(&self, expense: &Expense) -> DbResult<()> {
        debug!(reference = %expense.reference, "Inserting expense");

        sqlx::query(
            "INSERT INTO expenses ( \
                id, tenant_id, branch_id, expense_date, amount_cents, memo, \
                reference, journal_id, posted_at, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&expense.id)
        .bind(expense.tenant_id)
        .bind(expense.branch_id)
        .bind(expense.expense_date)
        .bind(expense.amount_cents)
        .bind(&expense.memo)
        .bind(&expense.reference)
        .bind(&expense.journal_id)
        .bind(expense.posted_at)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a payment document.
    pub async fn insert_payment(&self, payment: &Payment) -> DbResult<()> {
        debug!(reference = %payment.reference, "Inserting payment");

        sqlx::query(
            "INSERT INTO payments ( \
                id, tenant_id, branch_id, sale_id, payment_date, amount_cents, \
                method, reference, journal_id, posted_at, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&payment.id)
        .bind(payment.tenant_id)
        .bind(payment.branch_id)
        .bind(&payment.sale_id)
        .bind(payment.payment_date)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(&payment.journal_id)
        .bind(payment.posted_at)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an expense by ID, scoped to a tenant.
    pub async fn get_expense(&self, tenant_id: i64, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Gets a payment by ID, scoped to a tenant.
    pub async fn get_payment(&self, tenant_id: i64, id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Writes the one-way journal back-link onto a source document, on the
    /// caller's transaction. Only ever links an unposted document; posting
    /// the same document twice is refused here rather than producing a
    /// second journal link.
    pub async fn link_journal(
        &self,
        conn: &mut SqliteConnection,
        source: SourceDocument,
        tenant_id: i64,
        id: &str,
        journal_id: &str,
        posted_at: DateTime<Utc>,
    ) -> DbResult<()> {
        // The table name comes from a closed enum, never from input.
        let sql = match source {
            SourceDocument::Expense => {
                "UPDATE expenses SET journal_id = ?3, posted_at = ?4 \
                 WHERE tenant_id = ?1 AND id = ?2 AND journal_id IS NULL"
            }
            SourceDocument::Payment => {
                "UPDATE payments SET journal_id = ?3, posted_at = ?4 \
                 WHERE tenant_id = ?1 AND id = ?2 AND journal_id IS NULL"
            }
        };

        let result = sqlx::query(sql)
            .bind(tenant_id)
            .bind(id)
            .bind(journal_id)
            .bind(posted_at)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                format!("Unposted {} document", source.as_str()),
                id,
            ));
        }

        Ok(())
    }
}

/// Generates a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}
