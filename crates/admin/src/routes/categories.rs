//! Category management.
//!
//! Categories form a two-level tree: a parent must itself be top-level, and
//! a category that has children cannot be moved under another.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use opal_core::CategoryId;
use opal_core::catalog::{Category, CategoryPatch};
use opal_core::store::{CategoryStore, fallback};
use serde::Deserialize;
use tracing::instrument;

use super::products::Deleted;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

async fn load_parent(state: &AppState, parent_id: Option<&CategoryId>) -> Result<Option<Category>> {
    let Some(parent_id) = parent_id else {
        return Ok(None);
    };
    state
        .store()
        .get_category(parent_id)
        .await?
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("Parent category {parent_id} does not exist")))
}

/// List categories in name order.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(fallback::categories_or_empty(state.store()).await)
}

#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = Category::new(input.name.trim(), input.parent_id);
    let parent = load_parent(&state, category.parent_id.as_ref()).await?;
    category.validate(parent.as_ref())?;

    state.store().create_category(&category).await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, patch))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(mut patch): Json<CategoryPatch>,
) -> Result<Json<Category>> {
    if let Some(name) = &mut patch.name {
        *name = name.trim().to_string();
    }

    let mut preview = state
        .store()
        .get_category(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;
    preview.apply_patch(&patch);
    let parent = load_parent(&state, preview.parent_id.as_ref()).await?;
    preview.validate(parent.as_ref())?;

    if preview.parent_id.is_some() {
        let has_children = state
            .store()
            .list_categories()
            .await?
            .iter()
            .any(|c| c.parent_id.as_ref() == Some(&id));
        if has_children {
            return Err(AppError::BadRequest(
                "A category with subcategories must stay top-level".to_string(),
            ));
        }
    }

    let category = state
        .store()
        .update_category(&id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

    tracing::info!(category_id = %category.id, "Category updated");
    Ok(Json(category))
}

/// Delete a category. Its children become top-level on the next tree build.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Deleted>> {
    let deleted = state.store().delete_category(&id).await?;
    if deleted {
        tracing::info!(category_id = %id, "Category deleted");
    }
    Ok(Json(Deleted { deleted }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use opal_core::catalog::CategoryError;

    use super::*;
    use crate::state::test_state;

    async fn add(state: &AppState, name: &str, parent_id: Option<CategoryId>) -> Result<Category> {
        let input = CategoryInput {
            name: name.to_string(),
            parent_id,
        };
        create(State(state.clone()), Json(input))
            .await
            .map(|(_, Json(category))| category)
    }

    #[tokio::test]
    async fn test_tree_stays_two_levels() {
        let (state, _store) = test_state();
        let clothing = add(&state, " Clothing ", None).await.unwrap();
        assert_eq!(clothing.name, "Clothing");
        assert_eq!(clothing.slug, "clothing");

        let shirts = add(&state, "Shirts", Some(clothing.id.clone())).await.unwrap();

        let err = add(&state, "Linen", Some(shirts.id.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::Category(CategoryError::ParentNotTopLevel(_))));
    }

    #[tokio::test]
    async fn test_parent_with_children_cannot_be_nested() {
        let (state, _store) = test_state();
        let clothing = add(&state, "Clothing", None).await.unwrap();
        add(&state, "Shirts", Some(clothing.id.clone())).await.unwrap();
        let sale = add(&state, "Sale", None).await.unwrap();

        let patch = CategoryPatch {
            name: None,
            parent_id: Some(Some(sale.id)),
        };
        let err = update(State(state), Path(clothing.id), Json(patch))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_parent_is_rejected() {
        let (state, store) = test_state();
        let err = add(&state, "Orphan", Some(CategoryId::new("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.list_categories().await.unwrap().is_empty());
    }
}
