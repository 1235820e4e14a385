//! Export a populated store and restore it into another.

#![allow(clippy::unwrap_used)]

use opal_core::backup::{
    BACKUP_VERSION, Backup, RestoreError, RestorePhase, export_backup, restore_backup,
};
use opal_core::cart::{Cart, MemoryCartStore, Selection};
use opal_core::checkout::{NewOrder, OrderMaterializer};
use opal_core::pricing::{CheckoutSummary, index_products, price_cart};
use opal_core::store::{CatalogStore, CategoryStore, MemoryStore, OrderStore, SettingsStore};
use opal_core::{CurrencyCode, PaymentMethod};
use opal_integration_tests::{buyer, seed, settings};

async fn populated() -> MemoryStore {
    let store = MemoryStore::new();
    let ids = seed(&store).await;

    let mut cart = Cart::open(MemoryCartStore::new());
    cart.add(&ids.shirt, 2, &Selection::sized("L"));
    let catalog = index_products(store.list_products().await.unwrap());
    let priced = price_cart(&catalog, cart.list());
    let summary = CheckoutSummary::for_cart(&priced, &settings());
    let (contact, shipping_address) = buyer("buyer@example.com");

    OrderMaterializer::new("OPAL")
        .create_order(
            &store,
            NewOrder {
                items: priced.lines,
                contact,
                shipping_address,
                payment_method: PaymentMethod::Card,
                subtotal: summary.subtotal,
                shipping_cost: summary.shipping_cost,
                currency: summary.currency,
            },
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_restore_reproduces_export() {
    let source = populated().await;
    let backup = export_backup(&source).await.unwrap();
    assert_eq!(backup.version, BACKUP_VERSION);
    assert_eq!(backup.products.len(), 3);
    assert_eq!(backup.categories.len(), 1);
    assert_eq!(backup.orders.len(), 1);

    // Through JSON, as the CLI and admin API move it.
    let json = serde_json::to_string(&backup).unwrap();
    let parsed: Backup = serde_json::from_str(&json).unwrap();

    let target = MemoryStore::new();
    let journal = restore_backup(&target, &parsed).await.unwrap();
    assert!(journal.is_complete());
    assert_eq!(journal.completed.len(), RestorePhase::ALL.len());
    assert_eq!(journal.orders_restored, 1);

    let restored = export_backup(&target).await.unwrap();
    assert_eq!(restored.products, backup.products);
    assert_eq!(restored.categories, backup.categories);
    assert_eq!(restored.orders, backup.orders);
    assert_eq!(restored.store_settings, backup.store_settings);
}

#[tokio::test]
async fn test_restore_replaces_existing_data() {
    let backup = export_backup(&populated().await).await.unwrap();

    // The target already holds unrelated data, which must disappear.
    let target = populated().await;
    let stray = opal_core::catalog::Category::new("Stray", None);
    target.create_category(&stray).await.unwrap();

    restore_backup(&target, &backup).await.unwrap();

    assert_eq!(target.list_orders().await.unwrap(), backup.orders);
    assert!(target.get_category(&stray.id).await.unwrap().is_none());

    // Running it again from the top gives the same result.
    let journal = restore_backup(&target, &backup).await.unwrap();
    assert!(journal.is_complete());
    assert_eq!(target.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_restore_rejects_unknown_version_without_touching_data() {
    let target = populated().await;
    let mut backup = export_backup(&target).await.unwrap();
    backup.version = BACKUP_VERSION + 1;
    backup.products.clear();

    let err = restore_backup(&target, &backup).await.unwrap_err();
    assert!(matches!(err, RestoreError::UnsupportedVersion { .. }));
    assert_eq!(target.list_products().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_restore_into_offline_store_aborts_at_first_phase() {
    let backup = export_backup(&populated().await).await.unwrap();
    let target = MemoryStore::new();
    target.set_offline(true);

    match restore_backup(&target, &backup).await {
        Err(RestoreError::Aborted { phase, journal, .. }) => {
            assert_eq!(phase, RestorePhase::ClearProducts);
            assert!(journal.completed.is_empty());
        }
        other => panic!("expected an aborted restore, got {other:?}"),
    }
}

#[tokio::test]
async fn test_export_fails_rather_than_returning_an_empty_backup() {
    let store = populated().await;
    store.set_offline(true);
    assert!(export_backup(&store).await.is_err());

    store.set_offline(false);
    let settings = store.get_settings().await.unwrap().unwrap();
    assert_eq!(settings.currency, CurrencyCode::USD);
}
