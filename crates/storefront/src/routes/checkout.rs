//! Checkout and order tracking handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use opal_core::PaymentMethod;
use opal_core::checkout::{CheckoutError, NewOrder, PlacedOrder};
use opal_core::order::{Contact, Order, ShippingAddress};
use opal_core::pricing::{CheckoutSummary, price_cart};
use opal_core::store::{OrderStore, fallback};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{load_cart, save_cart};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub contact: Contact,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub order: PlacedOrder,
    pub summary: CheckoutSummary,
}

#[derive(Debug, Deserialize)]
pub struct TrackOrderQuery {
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub email: String,
}

/// Place an order for the session cart.
///
/// The catalog is read without degrading, so an unreachable backend yields a
/// 503 rather than an empty order. The cart is cleared only after the order
/// write succeeds; on any failure it is left intact so the buyer can retry.
#[instrument(skip(state, session, request))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let mut cart = load_cart(&session).await;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyOrder.into());
    }

    let catalog = state
        .catalog()
        .checkout_snapshot()
        .await
        .map_err(CheckoutError::from)?;
    let priced = price_cart(&catalog, cart.list());
    let settings = fallback::settings_or_default(state.store()).await;
    let summary = CheckoutSummary::for_cart(&priced, &settings);

    let input = NewOrder {
        items: priced.lines,
        contact: request.contact,
        shipping_address: request.shipping_address,
        payment_method: request.payment_method,
        subtotal: summary.subtotal,
        shipping_cost: summary.shipping_cost,
        currency: summary.currency,
    };

    let placed = match state.orders().create_order(state.store(), input).await {
        Ok(placed) => placed,
        Err(e) => {
            if e.is_retryable() {
                tracing::warn!(error = %e, "Checkout failed, cart kept for retry");
            }
            return Err(e.into());
        }
    };

    cart.clear();
    if let Err(e) = save_cart(&session, &cart).await {
        // The order exists; a stale cart is the lesser problem.
        tracing::error!(error = %e, order_number = %placed.order_number, "Failed to clear cart after checkout");
    }

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order: placed,
            summary,
        }),
    ))
}

/// Look up an order by its number and the buyer's email.
///
/// Both match case-insensitively. A failing backend reads as "not found".
#[instrument(skip(state, query))]
pub async fn track_order(
    State(state): State<AppState>,
    Query(query): Query<TrackOrderQuery>,
) -> Result<Json<Order>> {
    let order_number = query.order_number.trim();
    let email = query.email.trim();
    if order_number.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(
            "Order number and email are required".to_string(),
        ));
    }

    let order = match state
        .store()
        .find_order_by_number_and_email(order_number, email)
        .await
    {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(error = %e, "Order lookup failed");
            None
        }
    };

    order
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}
