//! Purchase receipts.

use serde::{Deserialize, Serialize};

use crate::types::{PlatformId, SeqKey, Timestamp};

/// Status an order is written with. There is no refund or cancellation
/// path, so every order stays in this state.
pub const ORDER_STATUS_COMPLETED: &str = "completed";

/// One completed purchase.
///
/// Buyer and product fields are snapshotted at purchase time, so the
/// receipt survives deletion of the product it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub user_id: PlatformId,
    pub user_name: String,
    pub user_display_id: u32,
    pub product_id: SeqKey,
    pub product_name: String,
    pub product_description: String,
    /// Price actually paid, in points.
    pub price: i64,
    pub ordered_at: Timestamp,
    pub status: String,
}

impl Order {
    /// Build a completed order snapshot from the buyer and product records.
    pub fn completed(
        user: &crate::user::User,
        product_id: impl Into<SeqKey>,
        product: &crate::product::Product,
        ordered_at: Timestamp,
    ) -> Self {
        Self {
            user_id: user.platform_id,
            user_name: user.full_name(),
            user_display_id: user.display_id,
            product_id: product_id.into(),
            product_name: product.name.clone(),
            product_description: product.description.clone(),
            price: product.price,
            ordered_at,
            status: ORDER_STATUS_COMPLETED.to_string(),
        }
    }
}
