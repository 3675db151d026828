//! Error taxonomy for the vendo engine
//!
//! Validation errors are rejected before any transaction opens; business
//! errors roll the enclosing transaction back; conflict errors tell a
//! retrying caller the work is already done; infrastructure errors are the
//! only retriable class.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for vendo operations
pub type Result<T> = std::result::Result<T, VendoError>;

/// Vendo error types
#[derive(Debug, Clone, Error)]
pub enum VendoError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Amount rejected before any transaction was opened
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // ========================================================================
    // Wallet Errors
    // ========================================================================

    /// Wallet not found (reference is a wallet id or an owner id)
    #[error("Wallet not found: {reference}")]
    WalletNotFound { reference: String },

    /// Wallet is administratively locked
    #[error("Wallet {wallet_id} is locked")]
    WalletLocked { wallet_id: Uuid },

    /// Insufficient funds
    #[error("Insufficient funds in wallet {wallet_id}: requested {requested}, available {available}")]
    InsufficientFunds {
        wallet_id: Uuid,
        requested: Decimal,
        available: Decimal,
    },

    // ========================================================================
    // Product Errors
    // ========================================================================

    /// Product not found (or soft-deleted)
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: Uuid },

    /// Product exists but is not purchasable
    #[error("Product {product_id} is inactive")]
    ProductInactive { product_id: Uuid },

    /// No units left
    #[error("Product {product_id} is out of stock")]
    ProductOutOfStock { product_id: Uuid },

    // ========================================================================
    // Order Errors
    // ========================================================================

    /// Order not found
    #[error("Order not found: {reference}")]
    OrderNotFound { reference: String },

    /// Idempotency-key conflict: the order already exists
    #[error("Order with idempotency key {idempotency_key} already exists")]
    DuplicateOrder { idempotency_key: String },

    /// Illegal order state transition
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: Uuid,
        from: String,
        to: String,
    },

    // ========================================================================
    // Gateway Errors
    // ========================================================================

    /// Confirmation event rejected (bad signature, malformed payload)
    #[error("Gateway event rejected: {reason}")]
    GatewayRejected { reason: String },

    /// The gateway could not be reached or errored
    #[error("Gateway unavailable: {reason}")]
    GatewayUnavailable { reason: String },

    // ========================================================================
    // Infrastructure Errors
    // ========================================================================

    /// A row lock could not be acquired within the configured window
    #[error("Lock acquisition timed out")]
    LockTimeout,

    /// Storage-level failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl VendoError {
    /// Create an invalid-amount error
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if the caller may safely retry the whole operation.
    ///
    /// Only infrastructure failures are retriable: the transaction rolled
    /// back without side effects. Business and conflict errors are final
    /// answers, and retrying a conflict would duplicate work.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::LockTimeout | Self::Storage { .. } | Self::GatewayUnavailable { .. }
        )
    }

    /// Get a stable error code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::WalletNotFound { .. } => "WALLET_NOT_FOUND",
            Self::WalletLocked { .. } => "WALLET_LOCKED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            Self::ProductInactive { .. } => "PRODUCT_INACTIVE",
            Self::ProductOutOfStock { .. } => "PRODUCT_OUT_OF_STOCK",
            Self::OrderNotFound { .. } => "ORDER_NOT_FOUND",
            Self::DuplicateOrder { .. } => "DUPLICATE_ORDER",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::GatewayRejected { .. } => "GATEWAY_REJECTED",
            Self::GatewayUnavailable { .. } => "GATEWAY_UNAVAILABLE",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
