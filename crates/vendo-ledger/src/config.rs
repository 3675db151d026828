//! Ledger engine configuration

use rust_decimal::Decimal;
use serde_json::Value;

/// Operational limits for the ledger engine, injected at construction so
/// they are testable per-instance rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Smallest withdrawal the engine accepts.
    pub min_withdrawal: Decimal,
    /// Largest single deposit the engine accepts.
    pub max_deposit: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_withdrawal: Decimal::ONE,
            max_deposit: Decimal::from(100_000),
        }
    }
}

impl LedgerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_withdrawal: std::env::var("LEDGER_MIN_WITHDRAWAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_withdrawal),
            max_deposit: std::env::var("LEDGER_MAX_DEPOSIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_deposit),
        }
    }
}

/// Empty metadata object for entries with nothing extra to record.
pub(crate) fn empty_metadata() -> Value {
    serde_json::json!({})
}
