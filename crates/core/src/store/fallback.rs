//! Degrading reads for display paths.
//!
//! A misconfigured or unreachable backend must not crash a page that only
//! displays data. These helpers log the cause and return empty results.
//! Catalog reads are idempotent, so they get one retry when the backend
//! reports itself unavailable.

use super::{CatalogStore, CategoryStore, OrderStore, SettingsStore, StoreError, StoreResult};
use crate::catalog::{Category, Product};
use crate::order::Order;
use crate::settings::StoreSettings;
use crate::types::ProductId;

async fn retry_once_if_unavailable<T, F, Fut>(mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    match op().await {
        Err(StoreError::Unavailable(reason)) => {
            tracing::debug!(%reason, "Catalog read unavailable, retrying once");
            op().await
        }
        other => other,
    }
}

/// Products by title, retried once but never degraded.
///
/// For write paths such as checkout, where an empty catalog would silently
/// drop every cart line.
pub async fn products<S: CatalogStore + ?Sized>(store: &S) -> StoreResult<Vec<Product>> {
    retry_once_if_unavailable(|| store.list_products()).await
}

/// Products by title, or empty.
pub async fn products_or_empty<S: CatalogStore + ?Sized>(store: &S) -> Vec<Product> {
    match products(store).await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products, showing none");
            Vec::new()
        }
    }
}

/// A single product, treating failure as absence.
pub async fn product_or_none<S: CatalogStore + ?Sized>(
    store: &S,
    id: &ProductId,
) -> Option<Product> {
    match retry_once_if_unavailable(|| store.get_product(id)).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, product_id = %id, "Failed to load product");
            None
        }
    }
}

pub async fn categories_or_empty<S: CategoryStore + ?Sized>(store: &S) -> Vec<Category> {
    match retry_once_if_unavailable(|| store.list_categories()).await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories, showing none");
            Vec::new()
        }
    }
}

pub async fn orders_or_empty<S: OrderStore + ?Sized>(store: &S) -> Vec<Order> {
    match store.list_orders().await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders, showing none");
            Vec::new()
        }
    }
}

/// Stored settings, or defaults when unset or unreadable.
pub async fn settings_or_default<S: SettingsStore + ?Sized>(store: &S) -> StoreSettings {
    match store.get_settings().await {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load store settings, using defaults");
            StoreSettings::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_reads_degrade_when_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);

        assert!(products_or_empty(&store).await.is_empty());
        assert!(categories_or_empty(&store).await.is_empty());
        assert!(orders_or_empty(&store).await.is_empty());
        assert_eq!(settings_or_default(&store).await, StoreSettings::default());
        assert!(
            product_or_none(&store, &ProductId::new("x"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_strict_product_read_reports_outage() {
        let store = MemoryStore::new();
        store.set_offline(true);

        let err = products(&store).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_retry_once_recovers_from_single_outage() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result = retry_once_if_unavailable(|| async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::Unavailable("blip".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_other_errors() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: StoreResult<()> = retry_once_if_unavailable(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("boom".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
