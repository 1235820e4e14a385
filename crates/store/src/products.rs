//! Product persistence.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_core::catalog::{Product, ProductPatch};
use opal_core::store::{CatalogStore, StoreError, StoreResult};
use opal_core::{CategoryId, ProductId};
use rust_decimal::Decimal;
use sqlx::types::Json;

use crate::{PgStore, parse_column, store_error};

const PRODUCT_COLUMNS: &str = "id, title, description, price, discount_price, currency, in_stock, \
     category_id, thumbnail, gallery, highlights, colors, sizes, size_prices, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    title: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    currency: String,
    in_stock: bool,
    category_id: Option<String>,
    thumbnail: Option<String>,
    gallery: Json<Vec<String>>,
    highlights: Json<Vec<String>>,
    colors: Json<Vec<String>>,
    sizes: Json<BTreeMap<String, u32>>,
    size_prices: Json<BTreeMap<String, Decimal>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            currency: parse_column("currency", &row.currency)?,
            in_stock: row.in_stock,
            category_id: row.category_id.map(CategoryId::new),
            thumbnail: row.thumbnail,
            gallery: row.gallery.0,
            highlights: row.highlights.0,
            colors: row.colors.0,
            sizes: row.sizes.0,
            size_prices: row.size_prices.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> StoreResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

#[async_trait]
impl CatalogStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM opal.product ORDER BY title, id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(store_error)?;

        into_products(rows)
    }

    #[tracing::instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM opal.product WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error)?;

        row.map(Product::try_from).transpose()
    }

    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO opal.product (
                id, title, description, price, discount_price, currency, in_stock,
                category_id, thumbnail, gallery, highlights, colors, sizes, size_prices,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.currency.code())
        .bind(product.in_stock)
        .bind(product.category_id.as_ref().map(CategoryId::as_str))
        .bind(product.thumbnail.as_deref())
        .bind(Json(&product.gallery))
        .bind(Json(&product.highlights))
        .bind(Json(&product.colors))
        .bind(Json(&product.sizes))
        .bind(Json(&product.size_prices))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, patch), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> StoreResult<Option<Product>> {
        let mut tx = self.pool().begin().await.map_err(store_error)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM opal.product WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut product = Product::try_from(row)?;
        product
            .apply_patch(patch)
            .map_err(|e| StoreError::Backend(format!("invalid product update: {e}")))?;

        sqlx::query(
            r"
            UPDATE opal.product
            SET title = $2, description = $3, price = $4, discount_price = $5, currency = $6,
                in_stock = $7, category_id = $8, thumbnail = $9, gallery = $10,
                highlights = $11, colors = $12, sizes = $13, size_prices = $14, updated_at = $15
            WHERE id = $1
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.currency.code())
        .bind(product.in_stock)
        .bind(product.category_id.as_ref().map(CategoryId::as_str))
        .bind(product.thumbnail.as_deref())
        .bind(Json(&product.gallery))
        .bind(Json(&product.highlights))
        .bind(Json(&product.colors))
        .bind(Json(&product.sizes))
        .bind(Json(&product.size_prices))
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(Some(product))
    }

    #[tracing::instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM opal.product WHERE id = $1")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn clear_products(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM opal.product")
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
