//! Ledger entry repository
//!
//! Entries are append-only: there is an insert and there are reads.
//! No update or delete exists on this table.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{DbLedgerEntry, DbResult, NewLedgerEntry};

pub struct LedgerEntryRepo {
    pool: PgPool,
}

impl LedgerEntryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry inside the caller's transaction, alongside the
    /// balance write it describes.
    pub async fn insert(
        conn: &mut PgConnection,
        entry: &NewLedgerEntry,
    ) -> DbResult<DbLedgerEntry> {
        let row = sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            INSERT INTO ledger_entries
                (wallet_id, kind, status, amount, balance_before, balance_after,
                 currency, description, reference_type, reference_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(entry.wallet_id)
        .bind(&entry.kind)
        .bind(&entry.status)
        .bind(entry.amount)
        .bind(entry.balance_before)
        .bind(entry.balance_after)
        .bind(&entry.currency)
        .bind(&entry.description)
        .bind(&entry.reference_type)
        .bind(entry.reference_id)
        .bind(&entry.metadata)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    /// Entry history for a wallet, newest first.
    pub async fn history(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        let entries = sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            SELECT * FROM ledger_entries
            WHERE wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// All entries caused by one order (both sides of a transfer).
    pub async fn find_by_reference(
        &self,
        reference_type: &str,
        reference_id: Uuid,
    ) -> DbResult<Vec<DbLedgerEntry>> {
        let entries = sqlx::query_as::<_, DbLedgerEntry>(
            r#"
            SELECT * FROM ledger_entries
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY created_at
            "#,
        )
        .bind(reference_type)
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
