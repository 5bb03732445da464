//! Repository for the products collection.

use kudos_core::error::CoreError;
use kudos_core::product::{self, Product};
use kudos_core::task::validate_text_field;
use kudos_core::types::{PlatformId, SeqKey, Timestamp};

use crate::error::{RepoError, StoreError};
use crate::store::JsonStore;

pub struct ProductRepo;

impl ProductRepo {
    /// Create a product under a fresh sequence key with a zeroed sold
    /// counter.
    pub async fn create(
        store: &JsonStore,
        name: &str,
        description: &str,
        price: i64,
        quantity: i64,
        created_by: PlatformId,
        now: Timestamp,
    ) -> Result<(SeqKey, Product), RepoError> {
        let name = validate_text_field("name", name)?;
        let description = validate_text_field("description", description)?;
        product::validate_price(price)?;
        product::validate_quantity(quantity)?;

        let created = Product {
            name,
            description,
            price,
            quantity,
            sold: 0,
            created_at: now,
            created_by,
        };
        let key = store.products().append(created.clone()).await?;
        Ok((key, created))
    }

    pub async fn find(store: &JsonStore, key: &str) -> Result<Option<Product>, StoreError> {
        Ok(store.products().get(key).await)
    }

    pub async fn get(store: &JsonStore, key: &str) -> Result<Product, RepoError> {
        Self::find(store, key)
            .await?
            .ok_or_else(|| CoreError::not_found("product", key).into())
    }

    /// Snapshot the whole catalog in numeric key order.
    pub async fn list(store: &JsonStore) -> Result<Vec<(SeqKey, Product)>, StoreError> {
        Ok(store.products().list().await)
    }

    /// Catalog entries a member can currently buy.
    pub async fn available(store: &JsonStore) -> Result<Vec<(SeqKey, Product)>, StoreError> {
        Ok(store
            .products()
            .list()
            .await
            .into_iter()
            .filter(|(_, p)| p.is_available())
            .collect())
    }

    /// Count one sale against the stock cap, atomically with the
    /// availability check.
    ///
    /// This is the step that makes the last unit of a finite product go to
    /// exactly one buyer: whichever purchase commits second fails here.
    pub async fn record_sale(store: &JsonStore, key: &str) -> Result<Product, RepoError> {
        store
            .products()
            .mutate(|records| {
                let item = records
                    .get_mut(key)
                    .ok_or_else(|| CoreError::not_found("product", key))?;
                item.record_sale()?;
                Ok(item.clone())
            })
            .await
    }

    /// Remove a product. Orders are untouched; they carry their own
    /// snapshot of what was bought.
    pub async fn delete(store: &JsonStore, key: &str) -> Result<Product, RepoError> {
        store
            .products()
            .mutate(|records| {
                records
                    .remove(key)
                    .ok_or_else(|| RepoError::from(CoreError::not_found("product", key)))
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    async fn create_product(store: &JsonStore, quantity: i64) -> SeqKey {
        let (key, _) = ProductRepo::create(
            store,
            "Sticker",
            "A holographic sticker",
            5,
            quantity,
            1,
            Utc::now(),
        )
        .await
        .unwrap();
        key
    }

    #[tokio::test]
    async fn create_validates_price_and_quantity() {
        let (_dir, store) = temp_store();
        let free = ProductRepo::create(&store, "a", "b", 0, 1, 1, Utc::now()).await;
        assert_matches!(free, Err(RepoError::Core(CoreError::Validation(_))));

        let negative = ProductRepo::create(&store, "a", "b", 5, -1, 1, Utc::now()).await;
        assert_matches!(negative, Err(RepoError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn available_filters_sold_out_items() {
        let (_dir, store) = temp_store();
        let limited = create_product(&store, 1).await;
        create_product(&store, 0).await;

        ProductRepo::record_sale(&store, &limited).await.unwrap();

        let available = ProductRepo::available(&store).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_ne!(available[0].0, limited);
    }

    #[tokio::test]
    async fn record_sale_stops_at_the_cap() {
        let (_dir, store) = temp_store();
        let key = create_product(&store, 2).await;

        ProductRepo::record_sale(&store, &key).await.unwrap();
        let second = ProductRepo::record_sale(&store, &key).await.unwrap();
        assert_eq!(second.sold, 2);

        let third = ProductRepo::record_sale(&store, &key).await;
        assert_matches!(third, Err(RepoError::Core(CoreError::OutOfStock(_))));
        assert_eq!(ProductRepo::get(&store, &key).await.unwrap().sold, 2);
    }

    #[tokio::test]
    async fn delete_leaves_orders_alone() {
        let (_dir, store) = temp_store();
        let key = create_product(&store, 0).await;

        let product = ProductRepo::get(&store, &key).await.unwrap();
        let buyer = kudos_core::user::User {
            platform_id: 100,
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            display_id: 1,
            points: 10,
            total_earned: 10,
            registered_at: Utc::now(),
        };
        let order = kudos_core::order::Order::completed(&buyer, key.clone(), &product, Utc::now());
        store.orders().append(order).await.unwrap();

        ProductRepo::delete(&store, &key).await.unwrap();
        assert!(ProductRepo::find(&store, &key).await.unwrap().is_none());
        assert_eq!(store.orders().len().await, 1);
    }
}
