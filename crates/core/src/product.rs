//! Shop catalog entries and stock accounting.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{PlatformId, Timestamp};

/// A shop item purchasable with points.
///
/// `quantity == 0` means unlimited stock; the `sold` counter then stays at
/// zero. For a finite product the invariant `sold <= quantity` holds, and
/// the item is unavailable exactly when `sold == quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    /// Price in points. Always positive.
    pub price: i64,
    /// Stock cap; zero disables the cap.
    pub quantity: i64,
    #[serde(default)]
    pub sold: i64,
    pub created_at: Timestamp,
    pub created_by: PlatformId,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.quantity == 0 || self.sold < self.quantity
    }

    /// Units left, or `None` for unlimited stock.
    pub fn remaining(&self) -> Option<i64> {
        if self.quantity == 0 {
            None
        } else {
            Some(self.quantity - self.sold)
        }
    }

    /// Count one sale against the stock cap.
    ///
    /// Unlimited products pass through unchanged. Fails without mutating
    /// when the cap is already reached, which keeps `sold` within bounds
    /// even if the caller skipped the availability screen.
    pub fn record_sale(&mut self) -> Result<(), CoreError> {
        if !self.is_available() {
            return Err(CoreError::OutOfStock(self.name.clone()));
        }
        if self.quantity > 0 {
            self.sold += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a product price (strictly positive).
pub fn validate_price(price: i64) -> Result<(), CoreError> {
    if price <= 0 {
        return Err(CoreError::Validation(format!(
            "Price must be a positive number, got {price}"
        )));
    }
    Ok(())
}

/// Validate a stock quantity (non-negative; zero means unlimited).
pub fn validate_quantity(quantity: i64) -> Result<(), CoreError> {
    if quantity < 0 {
        return Err(CoreError::Validation(format!(
            "Quantity must be zero (unlimited) or positive, got {quantity}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn product(quantity: i64, sold: i64) -> Product {
        Product {
            name: "Sticker".to_string(),
            description: "A holographic sticker".to_string(),
            price: 5,
            quantity,
            sold,
            created_at: Utc::now(),
            created_by: 1,
        }
    }

    #[test]
    fn unlimited_product_is_always_available() {
        let p = product(0, 0);
        assert!(p.is_available());
        assert_eq!(p.remaining(), None);
    }

    #[test]
    fn finite_product_unavailable_exactly_at_cap() {
        let p = product(2, 1);
        assert!(p.is_available());
        assert_eq!(p.remaining(), Some(1));

        let p = product(2, 2);
        assert!(!p.is_available());
        assert_eq!(p.remaining(), Some(0));
    }

    #[test]
    fn record_sale_increments_until_cap() {
        let mut p = product(2, 0);
        p.record_sale().unwrap();
        p.record_sale().unwrap();
        assert_eq!(p.sold, 2);

        let err = p.record_sale().unwrap_err();
        assert_matches!(err, CoreError::OutOfStock(_));
        assert_eq!(p.sold, 2);
    }

    #[test]
    fn record_sale_leaves_unlimited_counter_untouched() {
        let mut p = product(0, 0);
        p.record_sale().unwrap();
        p.record_sale().unwrap();
        assert_eq!(p.sold, 0);
    }

    #[test]
    fn price_and_quantity_validation() {
        assert!(validate_price(1).is_ok());
        assert!(validate_price(0).is_err());
        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(10).is_ok());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn missing_sold_defaults_to_zero() {
        let json = serde_json::json!({
            "name": "Sticker",
            "description": "A holographic sticker",
            "price": 5,
            "quantity": 2,
            "created_at": "2024-05-01T12:00:00Z",
            "created_by": 1
        });
        let p: Product = serde_json::from_value(json).unwrap();
        assert_eq!(p.sold, 0);
    }
}
