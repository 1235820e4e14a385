//! In-process store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CatalogStore, CategoryStore, OrderStore, SettingsStore, StoreError, StoreResult};
use crate::catalog::{Category, CategoryPatch, Product, ProductPatch};
use crate::order::{Order, normalize_order_number};
use crate::settings::StoreSettings;
use crate::types::{CategoryId, OrderId, OrderStatus, ProductId};

#[derive(Debug, Default)]
struct Collections {
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, Category>,
    orders: BTreeMap<OrderId, Order>,
    settings: Option<StoreSettings>,
}

/// Every collection behind one mutex.
///
/// Can be switched offline to exercise the unavailable-backend paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    offline: Mutex<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap_or_else(PoisonError::into_inner) = offline;
    }

    fn data(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        if *self.offline.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(StoreError::Unavailable("memory store is offline".to_owned()));
        }
        Ok(self.data.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn drain_count<K, V>(map: &mut BTreeMap<K, V>) -> u64 {
    let removed = u64::try_from(map.len()).unwrap_or(u64::MAX);
    map.clear();
    removed
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.data()?.products.values().cloned().collect();
        products.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.data()?.products.get(id).cloned())
    }

    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        let mut data = self.data()?;
        if data.products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {} exists", product.id)));
        }
        data.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> StoreResult<Option<Product>> {
        let mut data = self.data()?;
        let Some(product) = data.products.get_mut(id) else {
            return Ok(None);
        };
        product
            .apply_patch(patch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: &ProductId) -> StoreResult<bool> {
        Ok(self.data()?.products.remove(id).is_some())
    }

    async fn clear_products(&self) -> StoreResult<u64> {
        Ok(drain_count(&mut self.data()?.products))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.data()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.data()?.categories.get(id).cloned())
    }

    async fn create_category(&self, category: &Category) -> StoreResult<()> {
        let mut data = self.data()?;
        if data.categories.contains_key(&category.id) {
            return Err(StoreError::Conflict(format!(
                "category {} exists",
                category.id
            )));
        }
        data.categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn update_category(
        &self,
        id: &CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<Option<Category>> {
        let mut data = self.data()?;
        let Some(category) = data.categories.get_mut(id) else {
            return Ok(None);
        };
        category.apply_patch(patch);
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: &CategoryId) -> StoreResult<bool> {
        Ok(self.data()?.categories.remove(id).is_some())
    }

    async fn clear_categories(&self) -> StoreResult<u64> {
        Ok(drain_count(&mut self.data()?.categories))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut data = self.data()?;
        if data.orders.contains_key(&order.id)
            || data
                .orders
                .values()
                .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "order {} exists",
                order.order_number
            )));
        }
        data.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn order_number_exists(&self, order_number: &str) -> StoreResult<bool> {
        let wanted = normalize_order_number(order_number);
        Ok(self
            .data()?
            .orders
            .values()
            .any(|o| o.order_number == wanted))
    }

    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>> {
        Ok(self.data()?.orders.get(id).cloned())
    }

    async fn find_order_by_number_and_email(
        &self,
        order_number: &str,
        email: &str,
    ) -> StoreResult<Option<Order>> {
        Ok(self
            .data()?
            .orders
            .values()
            .find(|o| o.matches_lookup(order_number, email))
            .cloned())
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut data = self.data()?;
        match data.orders.get_mut(id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_order(&self, id: &OrderId) -> StoreResult<bool> {
        Ok(self.data()?.orders.remove(id).is_some())
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.data()?.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn clear_orders(&self) -> StoreResult<u64> {
        Ok(drain_count(&mut self.data()?.orders))
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_settings(&self) -> StoreResult<Option<StoreSettings>> {
        Ok(self.data()?.settings.clone())
    }

    async fn put_settings(&self, settings: &StoreSettings) -> StoreResult<()> {
        self.data()?.settings = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::order::{Contact, ShippingAddress};
    use crate::types::{CurrencyCode, PaymentMethod};

    #[tokio::test]
    async fn test_products_listed_by_title() {
        let store = MemoryStore::new();
        for title in ["Zebra", "Apple", "Mango"] {
            store
                .create_product(&Product::new(title, Decimal::ONE, CurrencyCode::USD))
                .await
                .unwrap();
        }
        let titles: Vec<_> = store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["Apple", "Mango", "Zebra"]);
    }

    #[tokio::test]
    async fn test_duplicate_product_id_conflicts() {
        let store = MemoryStore::new();
        let product = Product::new("Tee", Decimal::ONE, CurrencyCode::USD);
        store.create_product(&product).await.unwrap();
        assert!(matches!(
            store.create_product(&product).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.list_products().await.unwrap_err().is_unavailable());
        store.set_offline(false);
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_update_requires_expected_current_status() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let order = Order {
            id: OrderId::new("o-1"),
            order_number: "OPAL-00000001".to_string(),
            items: Vec::new(),
            contact: Contact {
                email: "buyer@example.com".to_string(),
                phone: "555-0100".to_string(),
            },
            shipping_address: ShippingAddress {
                address: "1 Main St".to_string(),
                city: String::new(),
                state: String::new(),
                postal_code: String::new(),
            },
            payment_method: PaymentMethod::Card,
            subtotal: Decimal::TEN,
            shipping_cost: Decimal::ZERO,
            total: Decimal::TEN,
            currency: CurrencyCode::USD,
            status: OrderStatus::Cancelled,
            created_at: now,
            updated_at: now,
        };
        store.insert_order(&order).await.unwrap();

        let moved = store
            .update_order_status(&order.id, OrderStatus::Pending, OrderStatus::Confirmed, now)
            .await
            .unwrap();
        assert!(!moved);
        let stored = store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);

        assert!(
            !store
                .update_order_status(&OrderId::new("nope"), OrderStatus::Pending, OrderStatus::Confirmed, now)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_order(&OrderId::new("nope")).await.unwrap());
    }
}
