//! Cart route handlers.
//!
//! The cart is kept in the session as a serialized entry list. Each request
//! loads it into a [`Cart`] over a [`MemoryCartStore`], applies the change,
//! and writes the blob back. Prices are never stored; they are resolved
//! against the current catalog on every read.

use axum::{Json, extract::State};
use opal_core::ProductId;
use opal_core::cart::{Cart, MemoryCartStore, Selection};
use opal_core::catalog::Product;
use opal_core::pricing::{CheckoutSummary, PricedLine, clamp_quantity, price_cart};
use opal_core::store::fallback;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Priced cart with the totals checkout would charge.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub summary: CheckoutSummary,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the session cart. An unreadable session yields an empty cart.
pub(crate) async fn load_cart(session: &Session) -> Cart<MemoryCartStore> {
    let blob = match session.get::<String>(session_keys::CART).await {
        Ok(blob) => blob.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session, starting empty");
            String::new()
        }
    };
    Cart::open(MemoryCartStore::from_blob(&blob))
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart<MemoryCartStore>) -> Result<()> {
    session
        .insert(session_keys::CART, cart.store().to_blob())
        .await?;
    Ok(())
}

/// Treat blank option values as "no selection".
fn selection(color: Option<String>, size: Option<String>) -> Selection {
    let present = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Selection::new(present(color), present(size))
}

/// Check that a product can be added with this selection.
fn validate_selection(product: &Product, selection: &Selection) -> Result<()> {
    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.title
        )));
    }
    if !product.offers_color(selection.color.as_deref()) {
        return Err(AppError::BadRequest(if product.colors.is_empty() {
            "This product has no colour options".to_string()
        } else {
            format!("Choose a colour from: {}", product.colors.join(", "))
        }));
    }
    if !product.offers_size(selection.size.as_deref()) {
        return Err(AppError::BadRequest(if product.sizes.is_empty() {
            "This product has no size options".to_string()
        } else {
            let sizes: Vec<&str> = product.sizes.keys().map(String::as_str).collect();
            format!("Choose a size from: {}", sizes.join(", "))
        }));
    }
    Ok(())
}

async fn render(state: &AppState, cart: &Cart<MemoryCartStore>) -> CartView {
    let catalog = state.catalog().snapshot().await;
    let priced = price_cart(&catalog, cart.list());
    let settings = fallback::settings_or_default(state.store()).await;
    let summary = CheckoutSummary::for_cart(&priced, &settings);

    CartView {
        subtotal: priced.subtotal,
        lines: priced.lines,
        summary,
        count: cart.count(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the priced cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let cart = load_cart(&session).await;
    Json(render(&state, &cart).await)
}

/// Cart badge count.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCount> {
    let cart = load_cart(&session).await;
    Json(CartCount {
        count: cart.count(),
    })
}

/// Add a product selection, merging with an identical line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = fallback::product_or_none(state.store(), &request.product_id)
        .await
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    let selection = selection(request.color, request.size);
    validate_selection(&product, &selection)?;

    let mut cart = load_cart(&session).await;
    cart.add(
        &product.id,
        clamp_quantity(request.quantity.unwrap_or(1)),
        &selection,
    );
    save_cart(&session, &cart).await?;

    tracing::debug!(product_id = %product.id, "Added to cart");
    Ok(Json(render(&state, &cart).await))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let selection = selection(request.color, request.size);
    let quantity = if request.quantity == 0 {
        0
    } else {
        clamp_quantity(request.quantity)
    };

    let mut cart = load_cart(&session).await;
    cart.set_quantity(&request.product_id, quantity, &selection);
    save_cart(&session, &cart).await?;

    Ok(Json(render(&state, &cart).await))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let selection = selection(request.color, request.size);

    let mut cart = load_cart(&session).await;
    cart.remove(&request.product_id, &selection);
    save_cart(&session, &cart).await?;

    Ok(Json(render(&state, &cart).await))
}
