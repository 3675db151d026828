//! Checkout configuration

/// Configuration for the purchase orchestrator, injected at construction.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Per-transaction statement timeout in milliseconds. A purchase that
    /// cannot acquire its locks within this window aborts and surfaces as
    /// a retryable `LockTimeout`.
    pub statement_timeout_ms: u64,
    /// Currency code recorded on gateway-path orders.
    pub currency: String,
    /// Decimal places of the currency, for minor-unit conversion toward
    /// the gateway.
    pub currency_decimals: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            statement_timeout_ms: 5_000,
            currency: "USD".to_string(),
            currency_decimals: 2,
        }
    }
}

impl CheckoutConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            statement_timeout_ms: std::env::var("CHECKOUT_STATEMENT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.statement_timeout_ms),
            currency: std::env::var("CHECKOUT_CURRENCY")
                .unwrap_or(defaults.currency),
            currency_decimals: std::env::var("CHECKOUT_CURRENCY_DECIMALS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.currency_decimals),
        }
    }
}
