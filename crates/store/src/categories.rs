//! Category persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_core::CategoryId;
use opal_core::catalog::{Category, CategoryPatch};
use opal_core::store::{CategoryStore, StoreResult};

use crate::{PgStore, store_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    parent_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            parent_id: row.parent_id.map(CategoryId::new),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, parent_id, created_at FROM opal.category ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[tracing::instrument(skip(self), fields(category_id = %id))]
    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, parent_id, created_at FROM opal.category WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(store_error)?;

        Ok(row.map(Category::from))
    }

    #[tracing::instrument(skip(self, category), fields(category_id = %category.id))]
    async fn create_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO opal.category (id, name, slug, parent_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(category.id.as_str())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.parent_id.as_ref().map(CategoryId::as_str))
        .bind(category.created_at)
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, patch), fields(category_id = %id))]
    async fn update_category(
        &self,
        id: &CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<Option<Category>> {
        let Some(mut category) = self.get_category(id).await? else {
            return Ok(None);
        };
        category.apply_patch(patch);

        let result = sqlx::query(
            "UPDATE opal.category SET name = $2, slug = $3, parent_id = $4 WHERE id = $1",
        )
        .bind(category.id.as_str())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.parent_id.as_ref().map(CategoryId::as_str))
        .execute(self.pool())
        .await
        .map_err(store_error)?;

        Ok((result.rows_affected() > 0).then_some(category))
    }

    #[tracing::instrument(skip(self), fields(category_id = %id))]
    async fn delete_category(&self, id: &CategoryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM opal.category WHERE id = $1")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn clear_categories(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM opal.category")
            .execute(self.pool())
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
