//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Wallet Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub currency: String,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbLedgerEntry {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: String,
    pub status: String,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub currency: String,
    pub description: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a ledger entry. The id and timestamp are assigned by
/// the store; everything else is snapshotted by the engine.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub wallet_id: Uuid,
    pub kind: String,
    pub status: String,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub currency: String,
    pub description: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub metadata: serde_json::Value,
}

// ============================================================================
// Product Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProduct {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub available_units: i32,
    pub initial_units: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Order Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub payment_method: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
    pub gateway_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub payment_method: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
    pub gateway_session_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}
