//! Cart to order to revenue, end to end.

#![allow(clippy::unwrap_used)]

use opal_core::cart::{Cart, CartEntry, JsonFileCartStore, MemoryCartStore, Selection};
use opal_core::catalog::ProductPatch;
use opal_core::checkout::{CheckoutError, NewOrder, OrderMaterializer, PlacedOrder};
use opal_core::lifecycle::{self, LifecycleError, OrderStats, TransitionPolicy, change_status};
use opal_core::pricing::{CheckoutSummary, index_products, price_cart};
use opal_core::store::{CatalogStore, MemoryStore, OrderStore, SettingsStore, fallback};
use opal_core::{CurrencyCode, OrderStatus, PaymentMethod};
use opal_integration_tests::{buyer, dec, seed};

async fn order_for(
    store: &MemoryStore,
    entries: &[CartEntry],
    email: &str,
) -> Result<PlacedOrder, CheckoutError> {
    let catalog = index_products(store.list_products().await.unwrap());
    let settings = store.get_settings().await.unwrap().unwrap_or_default();
    let priced = price_cart(&catalog, entries);
    let summary = CheckoutSummary::for_cart(&priced, &settings);
    let (contact, shipping_address) = buyer(email);

    OrderMaterializer::new("OPAL")
        .create_order(
            store,
            NewOrder {
                items: priced.lines,
                contact,
                shipping_address,
                payment_method: PaymentMethod::CashOnDelivery,
                subtotal: summary.subtotal,
                shipping_cost: summary.shipping_cost,
                currency: summary.currency,
            },
        )
        .await
}

#[tokio::test]
async fn test_cart_survives_reopen_and_prices_at_checkout() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");

    {
        let mut cart = Cart::open(JsonFileCartStore::new(&path));
        let large_red = Selection::new(Some("Red".to_string()), Some("L".to_string()));
        cart.add(&ids.shirt, 1, &large_red);
        cart.add(&ids.shirt, 1, &large_red);
        cart.add(&ids.mug, 1, &Selection::default());
    }

    // A fresh cart over the same file sees the merged lines.
    let cart = Cart::open(JsonFileCartStore::new(&path));
    assert_eq!(cart.list().len(), 2);
    assert_eq!(cart.count(), 3);

    let catalog = index_products(store.list_products().await.unwrap());
    let priced = price_cart(&catalog, cart.list());
    // Size price 28.00 x 2, discounted mug 9.50.
    assert_eq!(priced.subtotal, dec("65.50"));

    let summary = CheckoutSummary::for_cart(&priced, &opal_integration_tests::settings());
    assert_eq!(summary.shipping_cost, dec("0"));
    assert_eq!(summary.total, dec("65.50"));
}

#[tokio::test]
async fn test_order_is_a_snapshot_of_the_cart() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;

    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.mug, 1, &Selection::default());

    let placed = order_for(&store, cart.list(), "buyer@example.com")
        .await
        .unwrap();
    assert!(placed.order_number.starts_with("OPAL-"));
    cart.clear();
    assert!(cart.is_empty());

    // Under the free-shipping threshold: flat 5.00 added.
    let order = store.get_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(order.subtotal, dec("9.50"));
    assert_eq!(order.shipping_cost, dec("5.00"));
    assert_eq!(order.total, dec("14.50"));
    assert_eq!(order.status, OrderStatus::Pending);

    // Catalog edits do not reach placed orders.
    let patch = ProductPatch {
        price: Some(dec("99.00")),
        discount_price: Some(None),
        ..ProductPatch::default()
    };
    store.update_product(&ids.mug, &patch).await.unwrap();
    let again = store.get_order(&placed.order_id).await.unwrap().unwrap();
    assert_eq!(again.items, order.items);
    assert_eq!(again.items[0].unit_price, dec("9.50"));
}

#[tokio::test]
async fn test_lookup_ignores_case_and_requires_matching_email() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.mug, 2, &Selection::default());
    let placed = order_for(&store, cart.list(), "Buyer@Example.com").await.unwrap();

    let found = store
        .find_order_by_number_and_email(&placed.order_number.to_lowercase(), "BUYER@example.COM")
        .await
        .unwrap();
    assert_eq!(found.map(|o| o.id), Some(placed.order_id));

    let wrong_email = store
        .find_order_by_number_and_email(&placed.order_number, "someone@else.com")
        .await
        .unwrap();
    assert!(wrong_email.is_none());
}

#[tokio::test]
async fn test_empty_cart_cannot_be_ordered() {
    let store = MemoryStore::new();
    seed(&store).await;

    let err = order_for(&store, &[], "buyer@example.com").await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyOrder));
    assert!(store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lifecycle_and_revenue() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.mug, 1, &Selection::default());

    let kept = order_for(&store, cart.list(), "a@example.com").await.unwrap();
    let cancelled = order_for(&store, cart.list(), "b@example.com").await.unwrap();
    let policy = TransitionPolicy::strict();

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        change_status(&store, policy, &kept.order_id, status)
            .await
            .unwrap();
    }
    change_status(&store, policy, &cancelled.order_id, OrderStatus::Cancelled)
        .await
        .unwrap();

    // Delivered and cancelled are both terminal under the strict table.
    let err = change_status(&store, policy, &kept.order_id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Transition(_)));
    let err = change_status(&store, policy, &cancelled.order_id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Transition(_)));

    let orders = store.list_orders().await.unwrap();
    let stats = OrderStats::collect(&orders);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.count_for(OrderStatus::Delivered), 1);
    assert_eq!(stats.count_for(OrderStatus::Cancelled), 1);
    assert_eq!(stats.revenue, dec("14.50"));

    // Deleting removes the order from revenue entirely; a repeat is a no-op.
    assert!(lifecycle::delete_order(&store, &kept.order_id).await.unwrap());
    assert!(!lifecycle::delete_order(&store, &kept.order_id).await.unwrap());
    let orders = store.list_orders().await.unwrap();
    assert_eq!(lifecycle::revenue(&orders), dec("0"));
}

#[tokio::test]
async fn test_corrections_allow_moving_back() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.shirt, 1, &Selection::sized("M"));
    let placed = order_for(&store, cart.list(), "a@example.com").await.unwrap();

    let policy = TransitionPolicy::with_corrections();
    change_status(&store, policy, &placed.order_id, OrderStatus::Delivered)
        .await
        .unwrap();
    let order = change_status(&store, policy, &placed.order_id, OrderStatus::Pending)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_checkout_fails_cleanly_when_backend_is_down() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.mug, 1, &Selection::default());
    let entries = cart.list().to_vec();

    let catalog = index_products(store.list_products().await.unwrap());
    let priced = price_cart(&catalog, &entries);
    let (contact, shipping_address) = buyer("a@example.com");
    store.set_offline(true);

    let err = OrderMaterializer::new("OPAL")
        .create_order(
            &store,
            NewOrder {
                subtotal: priced.subtotal,
                items: priced.lines,
                contact,
                shipping_address,
                payment_method: PaymentMethod::Card,
                shipping_cost: dec("5.00"),
                currency: CurrencyCode::USD,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    // The caller keeps the cart for a retry.
    assert_eq!(cart.count(), 1);
}

#[tokio::test]
async fn test_checkout_catalog_read_fails_loudly_when_backend_is_down() {
    let store = MemoryStore::new();
    let ids = seed(&store).await;
    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.mug, 1, &Selection::default());

    store.set_offline(true);
    let err = CheckoutError::from(fallback::products(&store).await.unwrap_err());
    assert!(err.is_retryable());
    assert!(!matches!(err, CheckoutError::EmptyOrder));
    assert_eq!(cart.count(), 1);

    store.set_offline(false);
    let catalog = index_products(fallback::products(&store).await.unwrap());
    assert_eq!(price_cart(&catalog, cart.list()).lines.len(), 1);
}
