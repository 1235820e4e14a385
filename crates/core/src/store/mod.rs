//! Persistence collaborators.
//!
//! The domain talks to storage through these traits. `opal-store` implements
//! them on `PostgreSQL`; [`MemoryStore`] implements them in process for tests
//! and tooling.
//!
//! Writes always propagate errors. Read-heavy display paths go through the
//! [`fallback`] helpers, which degrade to empty results instead.

pub mod fallback;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::catalog::{Category, CategoryPatch, Product, ProductPatch};
use crate::order::Order;
use crate::settings::StoreSettings;
use crate::types::{CategoryId, OrderId, OrderStatus, ProductId};

pub use memory::MemoryStore;

/// Errors surfaced by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend not configured or unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("record not found")]
    NotFound,

    /// Uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Product documents, listed by title.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// Insert a product, keeping its id. An existing id is a conflict.
    async fn create_product(&self, product: &Product) -> StoreResult<()>;

    /// Apply a patch and return the updated product, or `None` if absent.
    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> StoreResult<Option<Product>>;

    /// Returns whether a product was removed.
    async fn delete_product(&self, id: &ProductId) -> StoreResult<bool>;

    /// Remove every product, returning how many were removed.
    async fn clear_products(&self) -> StoreResult<u64>;
}

/// Category documents, listed by name.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>>;

    async fn create_category(&self, category: &Category) -> StoreResult<()>;

    async fn update_category(
        &self,
        id: &CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<Option<Category>>;

    async fn delete_category(&self, id: &CategoryId) -> StoreResult<bool>;

    async fn clear_categories(&self) -> StoreResult<u64>;
}

/// Order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order. A duplicate id or order number is a conflict.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn order_number_exists(&self, order_number: &str) -> StoreResult<bool>;

    async fn get_order(&self, id: &OrderId) -> StoreResult<Option<Order>>;

    /// Buyer lookup: uppercased order number and case-insensitive email.
    async fn find_order_by_number_and_email(
        &self,
        order_number: &str,
        email: &str,
    ) -> StoreResult<Option<Order>>;

    /// Move an order from `from` to `to`, only while it is still in `from`.
    ///
    /// Returns `false` when the order is missing or its status has changed
    /// since it was read.
    async fn update_order_status(
        &self,
        id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn delete_order(&self, id: &OrderId) -> StoreResult<bool>;

    /// All orders, newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;

    async fn clear_orders(&self) -> StoreResult<u64>;
}

/// The settings singleton.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `None` until settings are first written.
    async fn get_settings(&self) -> StoreResult<Option<StoreSettings>>;

    async fn put_settings(&self, settings: &StoreSettings) -> StoreResult<()>;
}

/// A backend serving every collection.
pub trait DataStore: CatalogStore + CategoryStore + OrderStore + SettingsStore {}

impl<T> DataStore for T where T: CatalogStore + CategoryStore + OrderStore + SettingsStore {}
