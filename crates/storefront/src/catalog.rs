//! Cached catalog snapshot.
//!
//! Every cart and checkout request prices against the full product list, so
//! the list is held in a `moka` cache for 30 seconds. Admin edits become
//! visible once the entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use opal_core::pricing::{CatalogSnapshot, index_products};
use opal_core::store::{DataStore, StoreResult, fallback};

/// Lifetime of a cached snapshot.
pub const CATALOG_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
}

/// Read-through cache over the product list.
#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn DataStore>,
    cache: Cache<CacheKey, Arc<CatalogSnapshot>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_ttl(store, CATALOG_TTL)
    }

    #[must_use]
    pub fn with_ttl(store: Arc<dyn DataStore>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { store, cache }
    }

    /// Products keyed by id.
    ///
    /// A failed read yields an empty snapshot that is not cached, so the next
    /// request tries the backend again.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        if let Some(snapshot) = self.cache.get(&CacheKey::Products).await {
            return snapshot;
        }

        let products = fallback::products_or_empty(self.store.as_ref()).await;
        let snapshot = Arc::new(index_products(products));
        if !snapshot.is_empty() {
            self.cache
                .insert(CacheKey::Products, Arc::clone(&snapshot))
                .await;
        }
        snapshot
    }

    /// Products keyed by id, failing when the backend cannot be read.
    ///
    /// Checkout prices against this so an outage surfaces as a retryable
    /// error instead of an empty order.
    pub async fn checkout_snapshot(&self) -> StoreResult<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.cache.get(&CacheKey::Products).await {
            return Ok(snapshot);
        }

        let products = fallback::products(self.store.as_ref()).await?;
        let snapshot = Arc::new(index_products(products));
        if !snapshot.is_empty() {
            self.cache
                .insert(CacheKey::Products, Arc::clone(&snapshot))
                .await;
        }
        Ok(snapshot)
    }

    /// Drop the cached snapshot.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&CacheKey::Products).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opal_core::CurrencyCode;
    use opal_core::catalog::Product;
    use opal_core::store::{CatalogStore, MemoryStore, StoreError};
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_snapshot_is_cached_until_invalidated() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogCache::new(store.clone());

        let first = Product::new("Linen Shirt", Decimal::new(2500, 2), CurrencyCode::USD);
        store.create_product(&first).await.unwrap();
        assert_eq!(catalog.snapshot().await.len(), 1);

        let second = Product::new("Wool Scarf", Decimal::new(1800, 2), CurrencyCode::USD);
        store.create_product(&second).await.unwrap();
        assert_eq!(catalog.snapshot().await.len(), 1);

        catalog.invalidate().await;
        assert_eq!(catalog.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_read_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogCache::new(store.clone());
        let product = Product::new("Linen Shirt", Decimal::new(2500, 2), CurrencyCode::USD);
        store.create_product(&product).await.unwrap();

        store.set_offline(true);
        assert!(catalog.snapshot().await.is_empty());

        store.set_offline(false);
        assert_eq!(catalog.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_snapshot_propagates_outage() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogCache::new(store.clone());
        let product = Product::new("Linen Shirt", Decimal::new(2500, 2), CurrencyCode::USD);
        store.create_product(&product).await.unwrap();

        store.set_offline(true);
        let err = catalog.checkout_snapshot().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.set_offline(false);
        assert_eq!(catalog.checkout_snapshot().await.unwrap().len(), 1);
        store.set_offline(true);
        assert_eq!(catalog.checkout_snapshot().await.unwrap().len(), 1);
    }
}
