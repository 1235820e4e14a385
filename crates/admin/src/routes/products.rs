//! Product management and catalog import.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use opal_core::catalog::{Product, ProductPatch};
use opal_core::import::{self, ImportFormat, ImportOptions, ImportReport};
use opal_core::store::{CatalogStore, CategoryStore, fallback};
use opal_core::{CategoryId, CurrencyCode, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A new product as submitted by the product form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    /// Defaults to the store currency.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: BTreeMap<String, u32>,
    #[serde(default)]
    pub size_prices: BTreeMap<String, Decimal>,
}

impl ProductInput {
    fn into_product(self, default_currency: CurrencyCode) -> Product {
        let mut product = Product::new(
            self.title.trim(),
            self.price,
            self.currency.unwrap_or(default_currency),
        );
        product.description = self.description;
        product.discount_price = self.discount_price;
        product.in_stock = self.in_stock.unwrap_or(true);
        product.category_id = self.category_id;
        product.thumbnail = self.thumbnail.filter(|t| !t.trim().is_empty());
        product.gallery = self.gallery;
        product.highlights = self.highlights;
        product.colors = self.colors;
        product.sizes = self.sizes;
        product.size_prices = self.size_prices;
        product
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// `json` or `csv`; detected from the body when absent.
    pub format: Option<String>,
    #[serde(default)]
    pub commit: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub format: ImportFormat,
    pub committed: bool,
    /// Products written to the catalog (zero for a dry run).
    pub written: usize,
    #[serde(flatten)]
    pub report: ImportReport,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Reject a category reference that does not exist.
async fn ensure_category_exists(state: &AppState, id: Option<&CategoryId>) -> Result<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if state.store().get_category(id).await?.is_none() {
        return Err(AppError::BadRequest(format!("Category {id} does not exist")));
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// List products in title order.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(fallback::products_or_empty(state.store()).await)
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .store()
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Create a product.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let settings = fallback::settings_or_default(state.store()).await;
    let product = input.into_product(settings.currency);
    product.validate()?;
    ensure_category_exists(&state, product.category_id.as_ref()).await?;

    state.store().create_product(&product).await?;

    tracing::info!(product_id = %product.id, title = %product.title, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Apply a partial update.
///
/// The patch is validated against the current product before anything is
/// written, so an invalid patch leaves the stored product untouched.
#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let mut preview = state
        .store()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    preview.apply_patch(&patch)?;
    if let Some(Some(category_id)) = &patch.category_id {
        ensure_category_exists(&state, Some(category_id)).await?;
    }

    let product = state
        .store()
        .update_product(&id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    tracing::info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Deleted>> {
    let deleted = state.store().delete_product(&id).await?;
    if deleted {
        tracing::info!(product_id = %id, "Product deleted");
    }
    Ok(Json(Deleted { deleted }))
}

/// Parse a JSON or CSV catalog and optionally write it.
///
/// Without `commit=true` this is a dry run that only reports what would be
/// imported. Bad rows are reported and skipped either way.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn import_products(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Result<Json<ImportResponse>> {
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ImportFormat>().map_err(AppError::BadRequest)?,
        None => ImportFormat::detect(&body),
    };

    let settings = fallback::settings_or_default(state.store()).await;
    let options = ImportOptions {
        default_currency: settings.currency,
    };
    let mut report = import::parse_with(&body, format, options)?;

    let written = if query.commit {
        import::commit(state.store(), &mut report).await
    } else {
        0
    };

    Ok(Json(ImportResponse {
        format,
        committed: query.commit,
        written,
        report,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::test_state;

    fn mug_input() -> ProductInput {
        serde_json::from_str(r#"{"title":"Mug","price":"12.00"}"#).unwrap()
    }

    #[test]
    fn test_input_defaults() {
        let input: ProductInput =
            serde_json::from_str(r#"{"title":"  Linen Shirt ","price":"25.00"}"#).unwrap();
        let product = input.into_product(CurrencyCode::EUR);

        assert_eq!(product.title, "Linen Shirt");
        assert_eq!(product.currency, CurrencyCode::EUR);
        assert!(product.in_stock);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_input_discount_must_be_lower() {
        let input: ProductInput = serde_json::from_str(
            r#"{"title":"Mug","price":"10","discountPrice":"12","currency":"USD"}"#,
        )
        .unwrap();
        let product = input.into_product(CurrencyCode::EUR);

        assert_eq!(product.currency, CurrencyCode::USD);
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_blank_thumbnail_is_dropped() {
        let input: ProductInput =
            serde_json::from_str(r#"{"title":"Mug","price":"10","thumbnail":"  "}"#).unwrap();
        assert_eq!(input.into_product(CurrencyCode::USD).thumbnail, None);
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_product_untouched() {
        let (state, store) = test_state();
        let (_, Json(mug)) = create(State(state.clone()), Json(mug_input())).await.unwrap();

        let patch = ProductPatch {
            discount_price: Some(Some(Decimal::new(2000, 2))),
            ..ProductPatch::default()
        };
        let err = update(State(state), Path(mug.id.clone()), Json(patch))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Product(_)));
        let stored = store.get_product(&mug.id).await.unwrap().unwrap();
        assert_eq!(stored.discount_price, None);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let (state, store) = test_state();
        let mut input = mug_input();
        input.category_id = Some(CategoryId::new("missing"));

        let err = create(State(state), Json(input)).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_dry_run_then_commit() {
        let (state, store) = test_state();
        let csv = "Product Name,Price\nTee,20\nBroken,\n";

        let Json(dry) = import_products(
            State(state.clone()),
            Query(ImportQuery {
                format: None,
                commit: false,
            }),
            csv.to_string(),
        )
        .await
        .unwrap();
        assert_eq!(dry.format, ImportFormat::Csv);
        assert_eq!(dry.report.products.len(), 1);
        assert_eq!(dry.report.errors.len(), 1);
        assert_eq!(dry.written, 0);
        assert!(store.list_products().await.unwrap().is_empty());

        let Json(committed) = import_products(
            State(state),
            Query(ImportQuery {
                format: Some("csv".to_string()),
                commit: true,
            }),
            csv.to_string(),
        )
        .await
        .unwrap();
        assert!(committed.committed);
        assert_eq!(committed.written, 1);
        assert_eq!(store.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_import_format_is_bad_request() {
        let (state, _store) = test_state();
        let err = import_products(
            State(state),
            Query(ImportQuery {
                format: Some("xlsx".to_string()),
                commit: false,
            }),
            "a,b\n".to_string(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
