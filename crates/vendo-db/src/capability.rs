//! # Schema Capability Resolver
//!
//! The engine's deployments vary in what optional schema they carry: a
//! tenant database provisioned without the accounting module has no
//! `journals` / `journal_entries` / `accounts` tables, and legacy
//! databases predate branch-scoped inventory. Rather than branching on ad
//! hoc string checks at every call site, the answers are resolved ONCE per
//! `Database` handle into a typed capability set and cached; the engine's
//! logic is written against that set.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Capability Resolution                               │
//! │                                                                         │
//! │  first use ──► table_exists / column_exists queries ──► cached set      │
//! │                                                                         │
//! │  ledger_posting = false     → LedgerPoster skips, never fails           │
//! │  branch_scoped_stock = false→ every stock op collapses onto branch 0    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;

/// Checks whether a table exists in the connected database.
pub async fn table_exists(pool: &SqlitePool, name: &str) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Checks whether a column exists on a table.
///
/// `pragma_table_info` is SQLite's table-valued pragma function; it
/// returns zero rows for a missing table, which reads as "column absent".
pub async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// The resolved capability set the engine is typed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaCapabilities {
    /// All three ledger tables are present; posting is possible.
    pub ledger_posting: bool,

    /// `stock_levels.branch_id` exists; inventory is branch-scoped.
    /// When false, every stock operation collapses onto branch 0.
    pub branch_scoped_stock: bool,
}

impl SchemaCapabilities {
    /// Resolves the capability set against the live schema.
    pub async fn resolve(pool: &SqlitePool) -> DbResult<Self> {
        let ledger_posting = table_exists(pool, "journals").await?
            && table_exists(pool, "journal_entries").await?
            && table_exists(pool, "accounts").await?;

        let branch_scoped_stock = column_exists(pool, "stock_levels", "branch_id").await?;

        Ok(SchemaCapabilities {
            ledger_posting,
            branch_scoped_stock,
        })
    }

    /// Applies the branch-scoping policy to a requested branch id.
    #[inline]
    pub fn stock_branch(&self, requested: i64) -> i64 {
        if self.branch_scoped_stock {
            requested
        } else {
            0
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_resolve_on_migrated_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let caps = SchemaCapabilities::resolve(db.pool()).await.unwrap();
        assert!(caps.ledger_posting);
        assert!(caps.branch_scoped_stock);
        assert_eq!(caps.stock_branch(3), 3);
    }

    #[tokio::test]
    async fn test_missing_table_and_column() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(!table_exists(db.pool(), "no_such_table").await.unwrap());
        assert!(!column_exists(db.pool(), "sales", "no_such_column")
            .await
            .unwrap());
        assert!(!column_exists(db.pool(), "no_such_table", "id")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_ledger_capability_reflects_dropped_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::query("DROP TABLE journal_entries")
            .execute(db.pool())
            .await
            .unwrap();

        let caps = SchemaCapabilities::resolve(db.pool()).await.unwrap();
        assert!(!caps.ledger_posting);
        assert!(caps.branch_scoped_stock);
    }

    #[test]
    fn test_branch_collapse_policy() {
        let caps = SchemaCapabilities {
            ledger_posting: true,
            branch_scoped_stock: false,
        };
        assert_eq!(caps.stock_branch(7), 0);
        assert_eq!(caps.stock_branch(0), 0);
    }
}
