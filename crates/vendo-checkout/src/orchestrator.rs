//! Purchase orchestrator
//!
//! Owns the order state machine and the transaction shape of each
//! settlement path. Never returns a partially-applied result: either the
//! full sequence committed or nothing changed.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use vendo_db::{DbError, DbOrder, NewOrder, OrderRepo, ProductRepo, WalletRepo};
use vendo_gateway::{CheckoutSessionRequest, GatewayClient};
use vendo_ledger::LedgerEngine;
use vendo_types::{to_minor_units, OrderStatus, PaymentMethod, Result, VendoError};

use crate::config::CheckoutConfig;
use crate::inventory;

/// Purchase orchestrator over the inventory guard and the ledger engine.
pub struct CheckoutService<G: GatewayClient> {
    pool: PgPool,
    ledger: Arc<LedgerEngine>,
    gateway: Arc<G>,
    config: CheckoutConfig,
}

impl<G: GatewayClient> CheckoutService<G> {
    pub fn new(
        pool: PgPool,
        ledger: Arc<LedgerEngine>,
        gateway: Arc<G>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            pool,
            ledger,
            gateway,
            config,
        }
    }

    // =========================================================================
    // Wallet path
    // =========================================================================

    /// Purchase a product with the buyer's internal wallet balance.
    ///
    /// One transaction: reserve product, lock both wallets in
    /// deterministic order, debit buyer at the locked row's price, credit
    /// seller, decrement stock, insert the order already COMPLETED. The
    /// charged amount comes from the locked product row, never from the
    /// caller.
    ///
    /// Runs at read committed with explicit row locks. The locks serialize
    /// every decision-informing read; SERIALIZABLE would instead abort the
    /// lock-race loser with a serialization failure, and the loser must
    /// see `ProductOutOfStock`, not a retry-me conflict.
    ///
    /// Losing the last-unit race still leaves a FAILED order row behind as
    /// a fact record of the attempt; the error returned to the caller is
    /// unchanged.
    pub async fn purchase_with_wallet(&self, buyer_id: Uuid, product_id: Uuid) -> Result<DbOrder> {
        match self.wallet_purchase_tx(buyer_id, product_id).await {
            Ok(order) => {
                info!(
                    order_id = %order.id,
                    buyer_id = %buyer_id,
                    product_id = %product_id,
                    amount = %order.amount,
                    "wallet purchase completed"
                );
                Ok(order)
            }
            Err(reason @ VendoError::ProductOutOfStock { .. }) => {
                self.record_failed_wallet_order(buyer_id, product_id, &reason)
                    .await;
                Err(reason)
            }
            Err(other) => Err(other),
        }
    }

    async fn wallet_purchase_tx(&self, buyer_id: Uuid, product_id: Uuid) -> Result<DbOrder> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        self.apply_statement_timeout(&mut tx).await?;

        let product = inventory::reserve_one_unit(&mut tx, product_id).await?;

        let buyer_wallet = WalletRepo::find_by_user_on(&mut tx, buyer_id)
            .await?
            .ok_or_else(|| VendoError::WalletNotFound {
                reference: format!("user {buyer_id}"),
            })?;
        let seller_wallet = WalletRepo::find_by_user_on(&mut tx, product.merchant_id)
            .await?
            .ok_or_else(|| VendoError::WalletNotFound {
                reference: format!("user {}", product.merchant_id),
            })?;

        if buyer_wallet.currency != seller_wallet.currency {
            return Err(VendoError::invalid_amount(format!(
                "currency mismatch: buyer holds {}, seller holds {}",
                buyer_wallet.currency, seller_wallet.currency
            )));
        }

        LedgerEngine::lock_wallet_pair(&mut tx, buyer_wallet.id, seller_wallet.id).await?;

        let order_id = Uuid::new_v4();

        // A free product moves no money and writes no entries.
        if product.price > Decimal::ZERO {
            self.ledger
                .debit(
                    &mut tx,
                    buyer_wallet.id,
                    product.price,
                    order_id,
                    &format!("Purchase of {}", product.name),
                )
                .await?;
            self.ledger
                .credit(
                    &mut tx,
                    seller_wallet.id,
                    product.price,
                    order_id,
                    &format!("Sale of {}", product.name),
                )
                .await?;
        }

        inventory::decrement_one_unit(&mut tx, product_id).await?;

        let order = OrderRepo::insert(
            &mut tx,
            &NewOrder {
                id: order_id,
                buyer_id,
                seller_id: product.merchant_id,
                product_id,
                payment_method: PaymentMethod::Wallet.as_str().to_string(),
                status: OrderStatus::Completed.as_str().to_string(),
                amount: product.price,
                currency: buyer_wallet.currency.clone(),
                idempotency_key: Uuid::new_v4().to_string(),
                gateway_session_id: None,
                completed_at: Some(Utc::now()),
            },
        )
        .await?;

        tx.commit().await.map_err(storage)?;
        Ok(order)
    }

    /// Record a FAILED order for a purchase attempt that was rejected. The
    /// settlement transaction already rolled back; this row is a fact
    /// record, written best-effort so a storage hiccup here never masks
    /// the business answer.
    async fn record_failed_wallet_order(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        reason: &VendoError,
    ) {
        if let Err(e) = self
            .insert_failed_wallet_order(buyer_id, product_id, reason)
            .await
        {
            warn!(
                %buyer_id,
                %product_id,
                error = %e,
                "could not record failed wallet order"
            );
        }
    }

    async fn insert_failed_wallet_order(
        &self,
        buyer_id: Uuid,
        product_id: Uuid,
        reason: &VendoError,
    ) -> Result<DbOrder> {
        let product = ProductRepo::new(self.pool.clone())
            .find_by_id(product_id)
            .await?
            .ok_or(VendoError::ProductNotFound { product_id })?;

        // Same currency the successful path would have stamped.
        let currency = WalletRepo::new(self.pool.clone())
            .find_by_user(buyer_id)
            .await?
            .map(|w| w.currency)
            .unwrap_or_else(|| self.config.currency.clone());

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let order = OrderRepo::insert(
            &mut tx,
            &NewOrder {
                id: Uuid::new_v4(),
                buyer_id,
                seller_id: product.merchant_id,
                product_id,
                payment_method: PaymentMethod::Wallet.as_str().to_string(),
                status: OrderStatus::Failed.as_str().to_string(),
                amount: product.price,
                currency,
                idempotency_key: Uuid::new_v4().to_string(),
                gateway_session_id: None,
                completed_at: None,
            },
        )
        .await?;
        let order = OrderRepo::mark_failed(&mut tx, order.id, &reason.to_string()).await?;
        tx.commit().await.map_err(storage)?;
        Ok(order)
    }

    // =========================================================================
    // Gateway path
    // =========================================================================

    /// Start a gateway-settled purchase. Validates the product read-only
    /// (stock is re-checked at completion time), opens a checkout session
    /// and records a PENDING order. No wallet or stock mutation happens
    /// here.
    pub async fn purchase_with_gateway(
        &self,
        buyer_id: Uuid,
        buyer_email: &str,
        product_id: Uuid,
    ) -> Result<(DbOrder, String)> {
        let product = inventory::peek(&self.pool, product_id).await?;

        let amount_minor = to_minor_units(product.price, self.config.currency_decimals)?;
        let session = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                product_id,
                product_name: product.name.clone(),
                amount_minor,
                currency: self.config.currency.clone(),
                buyer_id,
                buyer_email: buyer_email.to_string(),
            })
            .await?;

        let mut tx = self.pool.begin().await.map_err(storage)?;
        let order = OrderRepo::insert(
            &mut tx,
            &NewOrder {
                id: Uuid::new_v4(),
                buyer_id,
                seller_id: product.merchant_id,
                product_id,
                payment_method: PaymentMethod::Gateway.as_str().to_string(),
                status: OrderStatus::Pending.as_str().to_string(),
                amount: product.price,
                currency: self.config.currency.clone(),
                idempotency_key: Uuid::new_v4().to_string(),
                gateway_session_id: Some(session.session_id.clone()),
                completed_at: None,
            },
        )
        .await?;
        tx.commit().await.map_err(storage)?;

        info!(
            order_id = %order.id,
            session_id = %session.session_id,
            product_id = %product_id,
            "gateway purchase pending"
        );
        Ok((order, session.checkout_url))
    }

    /// Complete an order left PENDING by the gateway path once payment is
    /// confirmed. Idempotent: confirmation events are delivered
    /// at-least-once, and a second delivery returns the already-settled
    /// order without a second credit.
    ///
    /// Stock is re-validated here, under the product lock. If it sold out
    /// in the meantime the order is marked FAILED with the reason, never
    /// COMPLETED; reconciling the buyer's external charge in that case is
    /// outside this engine.
    pub async fn complete_gateway_order(
        &self,
        session_id: &str,
        external_payment_id: &str,
    ) -> Result<DbOrder> {
        // Fast path before taking any lock.
        let existing = OrderRepo::new(self.pool.clone())
            .find_by_gateway_session(session_id)
            .await?
            .ok_or_else(|| VendoError::OrderNotFound {
                reference: format!("gateway session {session_id}"),
            })?;
        let status: OrderStatus = existing.status.parse()?;
        if status == OrderStatus::Completed || status.is_terminal() {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await.map_err(storage)?;
        self.apply_statement_timeout(&mut tx).await?;

        // Re-read under the order row lock; a concurrent delivery of the
        // same event blocks here and then observes the settled status.
        let order = OrderRepo::lock_by_gateway_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| VendoError::OrderNotFound {
                reference: format!("gateway session {session_id}"),
            })?;
        let status: OrderStatus = order.status.parse()?;
        if status == OrderStatus::Completed || status.is_terminal() {
            tx.rollback().await.map_err(storage)?;
            return Ok(order);
        }
        if !status.can_transition_to(OrderStatus::Completed) {
            return Err(VendoError::InvalidTransition {
                order_id: order.id,
                from: order.status.clone(),
                to: OrderStatus::Completed.as_str().to_string(),
            });
        }

        match inventory::reserve_one_unit(&mut tx, order.product_id).await {
            Ok(product) => {
                let seller_wallet = WalletRepo::find_by_user_on(&mut tx, order.seller_id)
                    .await?
                    .ok_or_else(|| VendoError::WalletNotFound {
                        reference: format!("user {}", order.seller_id),
                    })?;

                // The buyer already paid the gateway; only the seller side
                // moves on the internal ledger.
                if order.amount > Decimal::ZERO {
                    self.ledger
                        .credit(
                            &mut tx,
                            seller_wallet.id,
                            order.amount,
                            order.id,
                            &format!("Sale of {}", product.name),
                        )
                        .await?;
                }

                inventory::decrement_one_unit(&mut tx, order.product_id).await?;
                let updated =
                    OrderRepo::mark_completed(&mut tx, order.id, Some(external_payment_id))
                        .await?;
                tx.commit().await.map_err(storage)?;

                info!(order_id = %updated.id, session_id, "gateway order completed");
                Ok(updated)
            }
            Err(
                reason @ (VendoError::ProductOutOfStock { .. }
                | VendoError::ProductInactive { .. }
                | VendoError::ProductNotFound { .. }),
            ) => {
                let updated =
                    OrderRepo::mark_failed(&mut tx, order.id, &reason.to_string()).await?;
                tx.commit().await.map_err(storage)?;

                warn!(order_id = %updated.id, session_id, %reason, "gateway order failed at completion");
                Ok(updated)
            }
            Err(other) => Err(other),
        }
    }

    // =========================================================================
    // Order reads
    // =========================================================================

    pub async fn get_order(&self, order_id: Uuid) -> Result<DbOrder> {
        OrderRepo::new(self.pool.clone())
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| VendoError::OrderNotFound {
                reference: order_id.to_string(),
            })
    }

    pub async fn orders_for_buyer(
        &self,
        buyer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbOrder>> {
        Ok(OrderRepo::new(self.pool.clone())
            .list_by_buyer(buyer_id, limit, offset)
            .await?)
    }

    pub async fn orders_for_seller(
        &self,
        seller_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbOrder>> {
        Ok(OrderRepo::new(self.pool.clone())
            .list_by_seller(seller_id, limit, offset)
            .await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn apply_statement_timeout(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<()> {
        // SET LOCAL scopes the timeout to this transaction.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.config.statement_timeout_ms
        ))
        .execute(&mut **tx)
        .await
        .map_err(storage)?;
        Ok(())
    }
}

fn storage(e: sqlx::Error) -> VendoError {
    DbError::from(e).into()
}
