//! Wallet repository

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbError, DbResult, DbWallet};

/// Wallet repository
///
/// Balance writes go through [`WalletRepo::lock_for_update`] +
/// [`WalletRepo::update_balance`] on the engine's transaction; there is no
/// pool-level balance mutation on purpose.
pub struct WalletRepo {
    pool: PgPool,
}

impl WalletRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new wallet for a user
    pub async fn create(&self, user_id: Uuid, currency: &str) -> DbResult<DbWallet> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            r#"
            INSERT INTO wallets (user_id, currency)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Find wallet by ID (excludes soft-deleted)
    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT * FROM wallets WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Find a user's wallet
    pub async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT * FROM wallets WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Set the administrative lock flag
    pub async fn set_locked(&self, id: Uuid, locked: bool) -> DbResult<DbWallet> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            r#"
            UPDATE wallets SET locked = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(locked)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("wallet {id}")))?;

        Ok(wallet)
    }

    /// Soft-delete a wallet. Wallets are never hard-deleted.
    pub async fn soft_delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE wallets SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("wallet {id}")));
        }
        Ok(())
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Find a user's wallet on the caller's transaction, without locking.
    /// Used to resolve wallet ids before taking the pair lock in
    /// deterministic order.
    pub async fn find_by_user_on(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT * FROM wallets WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(wallet)
    }

    /// Read a wallet row under an exclusive lock, inside the caller's
    /// transaction. Blocks until the current lock holder commits or rolls
    /// back. Every balance decision must start here.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DbResult<Option<DbWallet>> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            "SELECT * FROM wallets WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(wallet)
    }

    /// Write a new balance computed from a locked read, inside the same
    /// transaction as that read.
    pub async fn update_balance(
        conn: &mut PgConnection,
        id: Uuid,
        new_balance: Decimal,
    ) -> DbResult<DbWallet> {
        let wallet = sqlx::query_as::<_, DbWallet>(
            r#"
            UPDATE wallets SET balance = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_balance)
        .fetch_one(conn)
        .await?;

        Ok(wallet)
    }
}
