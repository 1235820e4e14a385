//! Application state shared across handlers.

use std::sync::Arc;

use opal_core::checkout::OrderMaterializer;
use opal_core::store::DataStore;

use crate::catalog::CatalogCache;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the data store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn DataStore>,
    catalog: CatalogCache,
    orders: OrderMaterializer,
}

impl AppState {
    /// Create a new application state over any store backend.
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn DataStore>) -> Self {
        let catalog = CatalogCache::new(Arc::clone(&store));
        let orders = OrderMaterializer::new(config.order_number_prefix.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The backing store for every collection.
    #[must_use]
    pub fn store(&self) -> &dyn DataStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Order creation with this store's order number prefix.
    #[must_use]
    pub fn orders(&self) -> &OrderMaterializer {
        &self.inner.orders
    }
}
