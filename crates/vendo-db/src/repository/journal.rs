//! # Journal Repository
//!
//! Persistence for journals, journal entries and the chart of accounts.
//! A journal is written once at posting time with exactly two entries and
//! is never mutated afterwards.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vendo_core::{Account, Journal, JournalEntry};

const JOURNAL_COLUMNS: &str =
    "id, tenant_id, journal_date, reference, memo, source_type, source_id, created_at";

const ACCOUNT_COLUMNS: &str = "id, tenant_id, code, name, kind, is_active, created_at";

/// Repository for ledger storage.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    pool: SqlitePool,
}

impl JournalRepository {
    /// Creates a new JournalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        JournalRepository { pool }
    }

    // =========================================================================
    // Journals
    // =========================================================================

    /// Inserts a journal header on the caller's transaction.
    pub async fn insert_journal(
        &self,
        conn: &mut SqliteConnection,
        journal: &Journal,
    ) -> DbResult<()> {
        debug!(id = %journal.id, reference = %journal.reference, "Inserting journal");

        sqlx::query(
            "INSERT INTO journals ( \
                id, tenant_id, journal_date, reference, memo, source_type, source_id, created_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&journal.id)
        .bind(journal.tenant_id)
        .bind(journal.journal_date)
        .bind(&journal.reference)
        .bind(&journal.memo)
        .bind(&journal.source_type)
        .bind(&journal.source_id)
        .bind(journal.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one journal entry on the caller's transaction.
    pub async fn insert_entry(
        &self,
        conn: &mut SqliteConnection,
        entry: &JournalEntry,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO journal_entries (id, journal_id, account_id, debit_cents, credit_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&entry.id)
        .bind(&entry.journal_id)
        .bind(&entry.account_id)
        .bind(entry.debit_cents)
        .bind(entry.credit_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a journal by ID, scoped to a tenant.
    pub async fn get_by_id(&self, tenant_id: i64, id: &str) -> DbResult<Option<Journal>> {
        let journal = sqlx::query_as::<_, Journal>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journals WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(journal)
    }

    /// Gets all entries of a journal.
    pub async fn get_entries(&self, journal_id: &str) -> DbResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            "SELECT id, journal_id, account_id, debit_cents, credit_cents \
             FROM journal_entries WHERE journal_id = ?1 ORDER BY id",
        )
        .bind(journal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Sums the two sides of a journal: (total debit, total credit).
    /// Every posted journal must balance.
    pub async fn entry_totals(&self, journal_id: &str) -> DbResult<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(debit_cents), 0), COALESCE(SUM(credit_cents), 0) \
             FROM journal_entries WHERE journal_id = ?1",
        )
        .bind(journal_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Resolves an account by id, scoped to a tenant.
    pub async fn get_account(&self, tenant_id: i64, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Resolves an account by its business code.
    pub async fn get_account_by_code(
        &self,
        tenant_id: i64,
        code: &str,
    ) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE tenant_id = ?1 AND code = ?2"
        ))
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Inserts an account (seeding, tests; account CRUD is external).
    pub async fn insert_account(&self, account: &Account) -> DbResult<()> {
        debug!(code = %account.code, "Inserting account");

        sqlx::query(
            "INSERT INTO accounts (id, tenant_id, code, name, kind, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&account.id)
        .bind(account.tenant_id)
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.kind)
        .bind(account.is_active)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Generates a new journal ID.
pub fn generate_journal_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new journal entry ID.
pub fn generate_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new account ID.
pub fn generate_account_id() -> String {
    Uuid::new_v4().to_string()
}
