//! Money helpers
//!
//! Balances and prices are `rust_decimal::Decimal` end to end. The gateway
//! speaks integer minor units (cents), so the conversion lives here and is
//! exact or it fails.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{Result, VendoError};

/// Convert a decimal amount to integer minor units (e.g. cents for a
/// 2-decimal currency). Fails if the amount has residual precision beyond
/// `decimals` or does not fit in an i64.
pub fn to_minor_units(amount: Decimal, decimals: u32) -> Result<i64> {
    let scale = 10i64.checked_pow(decimals).ok_or_else(|| {
        VendoError::invalid_amount(format!("unsupported currency decimals: {decimals}"))
    })?;
    let scaled = amount
        .checked_mul(Decimal::from(scale))
        .ok_or_else(|| VendoError::invalid_amount("amount overflow scaling to minor units"))?;

    if scaled.fract() != Decimal::ZERO {
        return Err(VendoError::invalid_amount(format!(
            "amount {amount} has sub-minor-unit precision"
        )));
    }

    scaled
        .to_i64()
        .ok_or_else(|| VendoError::invalid_amount("amount does not fit in minor units"))
}

/// Convert integer minor units back to a decimal amount.
pub fn from_minor_units(minor: i64, decimals: u32) -> Decimal {
    Decimal::new(minor, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec!(199.99), 2).unwrap(), 19999);
        assert_eq!(to_minor_units(dec!(500), 2).unwrap(), 50000);
        assert_eq!(to_minor_units(dec!(0.01), 2).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(100), 0).unwrap(), 100);
    }

    #[test]
    fn test_rejects_sub_minor_precision() {
        assert!(to_minor_units(dec!(1.005), 2).is_err());
        assert!(to_minor_units(dec!(0.001), 2).is_err());
    }

    #[test]
    fn test_rejects_unsupported_decimals() {
        // 10^19 does not fit in i64.
        assert!(to_minor_units(dec!(1), 19).is_err());
        assert!(to_minor_units(dec!(1), 18).is_ok());
    }

    #[test]
    fn test_round_trip() {
        let amount = dec!(42.50);
        let minor = to_minor_units(amount, 2).unwrap();
        assert_eq!(from_minor_units(minor, 2), amount);
    }
}
