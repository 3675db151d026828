//! Inventory guard
//!
//! The check-then-act window on stock is closed by the product row lock,
//! not by optimistic retry: `reserve_one_unit` takes the lock and
//! re-reads availability under it, and `decrement_one_unit` may only run
//! after a successful reserve in the same transaction.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use vendo_db::{DbProduct, ProductRepo};
use vendo_types::{Result, VendoError};

/// Validate that a product row can be sold. Pure; used against both
/// locked and unlocked reads.
pub fn check_purchasable(product: &DbProduct) -> Result<()> {
    if product.deleted_at.is_some() {
        return Err(VendoError::ProductNotFound {
            product_id: product.id,
        });
    }
    if !product.active {
        return Err(VendoError::ProductInactive {
            product_id: product.id,
        });
    }
    if product.available_units <= 0 {
        return Err(VendoError::ProductOutOfStock {
            product_id: product.id,
        });
    }
    Ok(())
}

/// Read-only availability check for the deferred path. Takes no lock; the
/// decision is re-made under the lock at completion time.
pub async fn peek(pool: &PgPool, product_id: Uuid) -> Result<DbProduct> {
    let product = ProductRepo::new(pool.clone())
        .find_by_id(product_id)
        .await?
        .ok_or(VendoError::ProductNotFound { product_id })?;

    check_purchasable(&product)?;
    Ok(product)
}

/// Acquire the exclusive lock on a product row for the duration of the
/// enclosing transaction and validate availability under it. Whichever
/// request gets here first wins; the loser re-reads zero stock and fails
/// with `ProductOutOfStock`, a business answer rather than a conflict.
pub async fn reserve_one_unit(conn: &mut PgConnection, product_id: Uuid) -> Result<DbProduct> {
    let product = ProductRepo::lock_for_update(conn, product_id)
        .await?
        .ok_or(VendoError::ProductNotFound { product_id })?;

    check_purchasable(&product)?;
    Ok(product)
}

/// Take one unit of stock. Only valid after `reserve_one_unit` succeeded
/// in the same transaction.
pub async fn decrement_one_unit(conn: &mut PgConnection, product_id: Uuid) -> Result<DbProduct> {
    Ok(ProductRepo::decrement_available(conn, product_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product() -> DbProduct {
        DbProduct {
            id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            name: "E-book".to_string(),
            price: dec!(19.99),
            available_units: 3,
            initial_units: 10,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_purchasable() {
        assert!(check_purchasable(&product()).is_ok());
    }

    #[test]
    fn test_inactive_rejected() {
        let mut p = product();
        p.active = false;
        let err = check_purchasable(&p).unwrap_err();
        assert_eq!(err.error_code(), "PRODUCT_INACTIVE");
    }

    #[test]
    fn test_out_of_stock_rejected() {
        let mut p = product();
        p.available_units = 0;
        let err = check_purchasable(&p).unwrap_err();
        assert_eq!(err.error_code(), "PRODUCT_OUT_OF_STOCK");
    }

    #[test]
    fn test_soft_deleted_is_not_found() {
        let mut p = product();
        p.deleted_at = Some(Utc::now());
        let err = check_purchasable(&p).unwrap_err();
        assert_eq!(err.error_code(), "PRODUCT_NOT_FOUND");
    }

    #[test]
    fn test_inactive_checked_before_stock() {
        let mut p = product();
        p.active = false;
        p.available_units = 0;
        assert_eq!(check_purchasable(&p).unwrap_err().error_code(), "PRODUCT_INACTIVE");
    }
}
