//! Catalog browsing handlers.
//!
//! All reads here degrade: a failing backend yields empty lists, default
//! settings, or a 404, never an error page.

use axum::{
    Json,
    extract::{Path, State},
};
use opal_core::ProductId;
use opal_core::catalog::{CategoryTree, Product};
use opal_core::settings::StoreSettings;
use opal_core::store::fallback;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products in title order.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(fallback::products_or_empty(state.store()).await)
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    fallback::product_or_none(state.store(), &id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// The two-level category tree.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<CategoryTree> {
    let categories = fallback::categories_or_empty(state.store()).await;
    Json(CategoryTree::build(&categories))
}

/// Shipping and currency settings shown to buyers.
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Json<StoreSettings> {
    Json(fallback::settings_or_default(state.store()).await)
}
