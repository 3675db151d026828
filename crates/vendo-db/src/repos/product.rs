//! Product repository

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbError, DbProduct, DbResult};

pub struct ProductRepo {
    pool: PgPool,
}

impl ProductRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a product with its full stock available
    pub async fn create(
        &self,
        merchant_id: Uuid,
        name: &str,
        price: Decimal,
        units: i32,
    ) -> DbResult<DbProduct> {
        let product = sqlx::query_as::<_, DbProduct>(
            r#"
            INSERT INTO products (merchant_id, name, price, available_units, initial_units)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(merchant_id)
        .bind(name)
        .bind(price)
        .bind(units)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find product by ID (excludes soft-deleted). Read-only, no lock —
    /// not for decisions that lead to a write.
    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbProduct>> {
        let product = sqlx::query_as::<_, DbProduct>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// List a merchant's products
    pub async fn list_by_merchant(&self, merchant_id: Uuid) -> DbResult<Vec<DbProduct>> {
        let products = sqlx::query_as::<_, DbProduct>(
            r#"
            SELECT * FROM products
            WHERE merchant_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Activate or deactivate a product
    pub async fn set_active(&self, id: Uuid, active: bool) -> DbResult<DbProduct> {
        let product = sqlx::query_as::<_, DbProduct>(
            r#"
            UPDATE products SET active = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("product {id}")))?;

        Ok(product)
    }

    /// Soft-delete a product
    pub async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Read a product row under an exclusive lock, inside the caller's
    /// transaction. The stock decision is made from this row, not from any
    /// earlier unlocked read.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DbResult<Option<DbProduct>> {
        let product = sqlx::query_as::<_, DbProduct>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Take one unit of stock. Must follow a successful locked read in the
    /// same transaction; the `available_units > 0` guard backstops the
    /// CHECK constraint.
    pub async fn decrement_available(conn: &mut PgConnection, id: Uuid) -> DbResult<DbProduct> {
        let product = sqlx::query_as::<_, DbProduct>(
            r#"
            UPDATE products
            SET available_units = available_units - 1, updated_at = NOW()
            WHERE id = $1 AND available_units > 0
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::InvalidInput(format!("product {id} has no stock to decrement")))?;

        Ok(product)
    }
}
