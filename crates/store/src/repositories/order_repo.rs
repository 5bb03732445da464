//! Repository for the orders collection.

use kudos_core::order::Order;
use kudos_core::types::SeqKey;

use crate::error::StoreError;
use crate::store::JsonStore;

pub struct OrderRepo;

impl OrderRepo {
    /// Append a completed order under a fresh sequence key.
    pub async fn create(store: &JsonStore, order: Order) -> Result<SeqKey, StoreError> {
        store.orders().append(order).await
    }

    /// Snapshot all orders in numeric key order.
    pub async fn list(store: &JsonStore) -> Result<Vec<(SeqKey, Order)>, StoreError> {
        Ok(store.orders().list().await)
    }
}
