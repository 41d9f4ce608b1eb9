//! # Product Repository
//!
//! Read access to the product master plus the insert used by seeding and
//! tests. Product CRUD screens are an external collaborator; the engine
//! only ever resolves products to check existence, activity and the
//! `stock_tracked` flag.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendo_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, sku, name, stock_tracked, is_active, created_at, updated_at";

/// Repository for product reads (and seed inserts).
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id, scoped to a tenant.
    pub async fn get_by_id(&self, tenant_id: i64, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, tenant_id: i64, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 AND sku = ?2"
        ))
        .bind(tenant_id)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products for a tenant, sorted by name.
    pub async fn list_active(&self, tenant_id: i64, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE tenant_id = ?1 AND is_active = 1 ORDER BY name LIMIT ?2"
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            "INSERT INTO products ( \
                id, tenant_id, sku, name, stock_tracked, is_active, created_at, updated_at \
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&product.id)
        .bind(product.tenant_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.stock_tracked)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivates a product (soft delete). Historical documents keep
    /// referencing it; it just stops being sellable.
    pub async fn deactivate(&self, conn: &mut SqliteConnection, tenant_id: i64, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?3 \
             WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products for a tenant (diagnostics).
    pub async fn count(&self, tenant_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND is_active = 1",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample(tenant_id: i64, sku: &str) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            tenant_id,
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            stock_tracked: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample(1, "COKE-330");
        repo.insert(&product).await.unwrap();

        let found = repo.get_by_id(1, &product.id).await.unwrap().unwrap();
        assert_eq!(found.sku, "COKE-330");
        assert!(found.stock_tracked);

        // Tenant scoping: another tenant cannot see it
        assert!(repo.get_by_id(2, &product.id).await.unwrap().is_none());

        let by_sku = repo.get_by_sku(1, "COKE-330").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample(1, "DUP-1")).await.unwrap();
        let err = repo.insert(&sample(1, "DUP-1")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Same SKU under another tenant is fine
        repo.insert(&sample(2, "DUP-1")).await.unwrap();
    }
}
