//! Order repository

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbOrder, DbResult, NewOrder};

pub struct OrderRepo {
    pool: PgPool,
}

impl OrderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbOrder>> {
        let order = sqlx::query_as::<_, DbOrder>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn find_by_idempotency_key(&self, key: &str) -> DbResult<Option<DbOrder>> {
        let order =
            sqlx::query_as::<_, DbOrder>("SELECT * FROM orders WHERE idempotency_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(order)
    }

    pub async fn find_by_gateway_session(&self, session_id: &str) -> DbResult<Option<DbOrder>> {
        let order =
            sqlx::query_as::<_, DbOrder>("SELECT * FROM orders WHERE gateway_session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(order)
    }

    pub async fn list_by_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DbOrder>> {
        let orders = sqlx::query_as::<_, DbOrder>(
            "SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(buyer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn list_by_seller(
        &self,
        seller_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DbOrder>> {
        let orders = sqlx::query_as::<_, DbOrder>(
            "SELECT * FROM orders WHERE seller_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(seller_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Insert an order inside the caller's transaction. A duplicate
    /// idempotency key surfaces as `DbError::Duplicate` via the unique
    /// index, not an application-level check.
    pub async fn insert(conn: &mut PgConnection, order: &NewOrder) -> DbResult<DbOrder> {
        let row = sqlx::query_as::<_, DbOrder>(
            r#"
            INSERT INTO orders
                (id, buyer_id, seller_id, product_id, payment_method, status,
                 amount, currency, idempotency_key, gateway_session_id, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(order.buyer_id)
        .bind(order.seller_id)
        .bind(order.product_id)
        .bind(&order.payment_method)
        .bind(&order.status)
        .bind(order.amount)
        .bind(&order.currency)
        .bind(&order.idempotency_key)
        .bind(&order.gateway_session_id)
        .bind(order.completed_at)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    /// Lock the order row for a gateway session, inside the caller's
    /// transaction. Serializes concurrent deliveries of the same
    /// confirmation event.
    pub async fn lock_by_gateway_session(
        conn: &mut PgConnection,
        session_id: &str,
    ) -> DbResult<Option<DbOrder>> {
        let order = sqlx::query_as::<_, DbOrder>(
            "SELECT * FROM orders WHERE gateway_session_id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(conn)
        .await?;
        Ok(order)
    }

    /// Transition an order to COMPLETED with its settlement identifiers.
    pub async fn mark_completed(
        conn: &mut PgConnection,
        id: Uuid,
        gateway_payment_id: Option<&str>,
    ) -> DbResult<DbOrder> {
        let order = sqlx::query_as::<_, DbOrder>(
            r#"
            UPDATE orders
            SET status = 'COMPLETED', gateway_payment_id = COALESCE($2, gateway_payment_id),
                completed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(gateway_payment_id)
        .fetch_one(conn)
        .await?;
        Ok(order)
    }

    /// Transition an order to FAILED with the recorded reason.
    pub async fn mark_failed(
        conn: &mut PgConnection,
        id: Uuid,
        reason: &str,
    ) -> DbResult<DbOrder> {
        let order = sqlx::query_as::<_, DbOrder>(
            r#"
            UPDATE orders
            SET status = 'FAILED', failure_reason = $2, failed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_one(conn)
        .await?;
        Ok(order)
    }
}
