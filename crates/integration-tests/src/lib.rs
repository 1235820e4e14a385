//! Integration tests for Opal.
//!
//! The tests under `tests/` drive the core pipeline end to end against
//! [`MemoryStore`]: cart, pricing, order creation, lookup, status changes,
//! revenue, catalog import and backup round trips. No database or running
//! server is needed.
//!
//! ```bash
//! cargo test -p opal-integration-tests
//! ```
//!
//! This module holds the shared fixtures.

use opal_core::catalog::{Category, Product};
use opal_core::order::{Contact, ShippingAddress};
use opal_core::settings::StoreSettings;
use opal_core::store::{CatalogStore, CategoryStore, MemoryStore, SettingsStore};
use opal_core::{CategoryId, CurrencyCode, ProductId};
use rust_decimal::Decimal;

/// Parse a decimal literal.
///
/// # Panics
///
/// Panics on an invalid literal; fixtures only.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Ids of the seeded catalog.
pub struct Seeded {
    pub clothing: CategoryId,
    /// 25.00, sizes S/M/L with L priced at 28.00, colours Red/Blue.
    pub shirt: ProductId,
    /// 12.00 discounted to 9.50.
    pub mug: ProductId,
    /// Out of stock.
    pub poster: ProductId,
}

/// Flat 5.00 shipping, free from 60.00.
#[must_use]
pub fn settings() -> StoreSettings {
    StoreSettings {
        shipping_cost: dec("5.00"),
        free_shipping_threshold: dec("60.00"),
        currency: CurrencyCode::USD,
        currency_symbol: "$".to_string(),
        updated_at: None,
    }
}

/// Fill a store with a small catalog and settings.
///
/// # Panics
///
/// Panics if the store rejects a write; fixtures only.
#[allow(clippy::unwrap_used)]
pub async fn seed(store: &MemoryStore) -> Seeded {
    let clothing = Category::new("Clothing", None);
    store.create_category(&clothing).await.unwrap();

    let mut shirt = Product::new("Linen Shirt", dec("25.00"), CurrencyCode::USD);
    shirt.id = ProductId::new("shirt");
    shirt.category_id = Some(clothing.id.clone());
    shirt.colors = vec!["Red".to_string(), "Blue".to_string()];
    for size in ["S", "M", "L"] {
        shirt.sizes.insert(size.to_string(), 10);
    }
    shirt.size_prices.insert("L".to_string(), dec("28.00"));

    let mut mug = Product::new("Enamel Mug", dec("12.00"), CurrencyCode::USD);
    mug.id = ProductId::new("mug");
    mug.discount_price = Some(dec("9.50"));

    let mut poster = Product::new("Poster", dec("15.00"), CurrencyCode::USD);
    poster.id = ProductId::new("poster");
    poster.in_stock = false;

    for product in [&shirt, &mug, &poster] {
        store.create_product(product).await.unwrap();
    }
    store.put_settings(&settings()).await.unwrap();

    Seeded {
        clothing: clothing.id,
        shirt: shirt.id,
        mug: mug.id,
        poster: poster.id,
    }
}

/// Buyer details that pass checkout validation.
#[must_use]
pub fn buyer(email: &str) -> (Contact, ShippingAddress) {
    (
        Contact {
            email: email.to_string(),
            phone: "555-0100".to_string(),
        },
        ShippingAddress {
            address: "12 Harbour Road".to_string(),
            city: "Portsmouth".to_string(),
            state: "NH".to_string(),
            postal_code: "03801".to_string(),
        },
    )
}
