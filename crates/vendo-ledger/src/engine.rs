//! The ledger engine proper

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use vendo_db::{DbLedgerEntry, DbWallet, LedgerEntryRepo, NewLedgerEntry, WalletRepo};
use vendo_types::{EntryKind, EntryStatus, Result, VendoError};

use crate::config::{empty_metadata, LedgerConfig};

/// Reference type recorded on transfer entries caused by an order.
pub const ORDER_REFERENCE: &str = "order";

/// Wallet Ledger Engine
pub struct LedgerEngine {
    pool: PgPool,
    config: LedgerConfig,
}

impl LedgerEngine {
    pub fn new(pool: PgPool, config: LedgerConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // Wallet lifecycle
    // =========================================================================

    /// Create a wallet for a new account holder.
    pub async fn create_wallet(&self, user_id: Uuid, currency: &str) -> Result<DbWallet> {
        let repo = WalletRepo::new(self.pool.clone());
        let wallet = repo.create(user_id, currency).await?;
        info!(wallet_id = %wallet.id, user_id = %user_id, "wallet created");
        Ok(wallet)
    }

    /// Fetch a user's wallet.
    pub async fn get_wallet(&self, user_id: Uuid) -> Result<DbWallet> {
        let repo = WalletRepo::new(self.pool.clone());
        repo.find_by_user(user_id)
            .await?
            .ok_or_else(|| VendoError::WalletNotFound {
                reference: format!("user {user_id}"),
            })
    }

    /// Entry history for a wallet, newest first.
    pub async fn history(
        &self,
        wallet_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbLedgerEntry>> {
        let repo = LedgerEntryRepo::new(self.pool.clone());
        Ok(repo.history(wallet_id, limit, offset).await?)
    }

    // =========================================================================
    // Self-contained operations (own transaction)
    // =========================================================================

    /// Deposit funds into a wallet.
    pub async fn deposit(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<(DbWallet, DbLedgerEntry)> {
        validate_deposit(&self.config, amount)?;

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let wallet = Self::lock_wallet(&mut tx, wallet_id).await?;
        let result = Self::apply(
            &mut tx,
            wallet,
            EntryKind::Deposit,
            amount,
            None,
            None,
            description,
        )
        .await?;
        tx.commit().await.map_err(storage)?;

        info!(wallet_id = %wallet_id, %amount, "deposit committed");
        Ok(result)
    }

    /// Withdraw funds from a wallet.
    pub async fn withdraw(
        &self,
        wallet_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<(DbWallet, DbLedgerEntry)> {
        validate_withdrawal(&self.config, amount)?;

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let wallet = Self::lock_wallet(&mut tx, wallet_id).await?;
        let result = Self::apply(
            &mut tx,
            wallet,
            EntryKind::Withdrawal,
            amount,
            None,
            None,
            description,
        )
        .await?;
        tx.commit().await.map_err(storage)?;

        info!(wallet_id = %wallet_id, %amount, "withdrawal committed");
        Ok(result)
    }

    // =========================================================================
    // Transaction-scoped transfer halves (orchestrator only)
    // =========================================================================

    /// Debit a wallet as the paying half of a purchase. Runs on the
    /// caller's open transaction; commits nothing itself.
    pub async fn debit(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: Decimal,
        order_id: Uuid,
        description: &str,
    ) -> Result<(DbWallet, DbLedgerEntry)> {
        if amount <= Decimal::ZERO {
            return Err(VendoError::invalid_amount("debit amount must be positive"));
        }
        let wallet = Self::lock_wallet(conn, wallet_id).await?;
        debug!(wallet_id = %wallet_id, %amount, order_id = %order_id, "debit");
        Self::apply(
            conn,
            wallet,
            EntryKind::Payment,
            amount,
            Some(ORDER_REFERENCE),
            Some(order_id),
            description,
        )
        .await
    }

    /// Credit a wallet as the receiving half of a purchase. Runs on the
    /// caller's open transaction; commits nothing itself.
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: Decimal,
        order_id: Uuid,
        description: &str,
    ) -> Result<(DbWallet, DbLedgerEntry)> {
        if amount <= Decimal::ZERO {
            return Err(VendoError::invalid_amount("credit amount must be positive"));
        }
        let wallet = Self::lock_wallet(conn, wallet_id).await?;
        debug!(wallet_id = %wallet_id, %amount, order_id = %order_id, "credit");
        Self::apply(
            conn,
            wallet,
            EntryKind::Earning,
            amount,
            Some(ORDER_REFERENCE),
            Some(order_id),
            description,
        )
        .await
    }

    /// Acquire both wallet row locks of a transfer in ascending-UUID order,
    /// so two simultaneous purchases with the roles reversed cannot
    /// deadlock. Returns the wallets in argument order.
    pub async fn lock_wallet_pair(
        conn: &mut PgConnection,
        a: Uuid,
        b: Uuid,
    ) -> Result<(DbWallet, DbWallet)> {
        if a == b {
            let w = Self::lock_wallet(conn, a).await?;
            return Ok((w.clone(), w));
        }

        let (first, second) = ordered_pair(a, b);
        let w_first = Self::lock_wallet(conn, first).await?;
        let w_second = Self::lock_wallet(conn, second).await?;

        if first == a {
            Ok((w_first, w_second))
        } else {
            Ok((w_second, w_first))
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn lock_wallet(conn: &mut PgConnection, wallet_id: Uuid) -> Result<DbWallet> {
        WalletRepo::lock_for_update(conn, wallet_id)
            .await?
            .ok_or_else(|| VendoError::WalletNotFound {
                reference: wallet_id.to_string(),
            })
    }

    /// Apply one balance change and append its audit entry. `wallet` must
    /// come from a locked read on the same connection.
    async fn apply(
        conn: &mut PgConnection,
        wallet: DbWallet,
        kind: EntryKind,
        amount: Decimal,
        reference_type: Option<&str>,
        reference_id: Option<Uuid>,
        description: &str,
    ) -> Result<(DbWallet, DbLedgerEntry)> {
        if wallet.locked {
            return Err(VendoError::WalletLocked {
                wallet_id: wallet.id,
            });
        }

        let balance_before = wallet.balance;
        let balance_after = if kind.is_credit() {
            balance_before + amount
        } else {
            if amount > balance_before {
                return Err(VendoError::InsufficientFunds {
                    wallet_id: wallet.id,
                    requested: amount,
                    available: balance_before,
                });
            }
            balance_before - amount
        };

        let updated = WalletRepo::update_balance(conn, wallet.id, balance_after).await?;

        let entry = LedgerEntryRepo::insert(
            conn,
            &NewLedgerEntry {
                wallet_id: wallet.id,
                kind: kind.as_str().to_string(),
                status: EntryStatus::Completed.as_str().to_string(),
                amount,
                balance_before,
                balance_after,
                currency: wallet.currency.clone(),
                description: description.to_string(),
                reference_type: reference_type.map(str::to_string),
                reference_id,
                metadata: empty_metadata(),
            },
        )
        .await?;

        Ok((updated, entry))
    }
}

/// Deterministic lock-acquisition order for a wallet pair.
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn validate_deposit(config: &LedgerConfig, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(VendoError::invalid_amount("deposit amount must be positive"));
    }
    if amount > config.max_deposit {
        return Err(VendoError::invalid_amount(format!(
            "deposit amount {amount} exceeds maximum {}",
            config.max_deposit
        )));
    }
    Ok(())
}

fn validate_withdrawal(config: &LedgerConfig, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(VendoError::invalid_amount(
            "withdrawal amount must be positive",
        ));
    }
    if amount < config.min_withdrawal {
        return Err(VendoError::invalid_amount(format!(
            "withdrawal amount {amount} is below minimum {}",
            config.min_withdrawal
        )));
    }
    Ok(())
}

fn storage(e: sqlx::Error) -> VendoError {
    vendo_db::DbError::from(e).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> LedgerConfig {
        LedgerConfig {
            min_withdrawal: dec!(1),
            max_deposit: dec!(10000),
        }
    }

    #[test]
    fn test_deposit_validation() {
        let cfg = config();
        assert!(validate_deposit(&cfg, dec!(0.01)).is_ok());
        assert!(validate_deposit(&cfg, dec!(10000)).is_ok());
        assert!(validate_deposit(&cfg, dec!(0)).is_err());
        assert!(validate_deposit(&cfg, dec!(-5)).is_err());
        assert!(validate_deposit(&cfg, dec!(10000.01)).is_err());
    }

    #[test]
    fn test_withdrawal_validation() {
        let cfg = config();
        assert!(validate_withdrawal(&cfg, dec!(1)).is_ok());
        assert!(validate_withdrawal(&cfg, dec!(500)).is_ok());
        assert!(validate_withdrawal(&cfg, dec!(0.99)).is_err());
        assert!(validate_withdrawal(&cfg, dec!(0)).is_err());
        assert!(validate_withdrawal(&cfg, dec!(-1)).is_err());
    }

    #[test]
    fn test_ordered_pair_deterministic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
        let (first, second) = ordered_pair(a, b);
        assert!(first <= second);
        assert_eq!(ordered_pair(a, a), (a, a));
    }
}
