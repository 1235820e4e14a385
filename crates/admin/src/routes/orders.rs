//! Order management: listing, status changes and deletion.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use opal_core::lifecycle::{self, change_status};
use opal_core::order::Order;
use opal_core::store::{OrderStore, fallback};
use opal_core::{OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::products::Deleted;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// An order with the statuses it may move to next.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub next_statuses: Vec<OrderStatus>,
}

impl OrderDetail {
    fn new(state: &AppState, order: Order) -> Self {
        let next_statuses = state.transition_policy().next_statuses(order.status);
        Self {
            order,
            next_statuses,
        }
    }
}

/// List orders, newest first, optionally filtered by status.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Order>> {
    let mut orders = fallback::orders_or_empty(state.store()).await;
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    Json(orders)
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = state
        .store()
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    Ok(Json(OrderDetail::new(&state, order)))
}

/// Move an order to a new status. Illegal moves are rejected with 409.
#[instrument(skip(state, admin, request))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<OrderDetail>> {
    let order = change_status(
        state.store(),
        state.transition_policy(),
        &id,
        request.status,
    )
    .await?;
    tracing::info!(
        admin = %admin.email,
        order_number = %order.order_number,
        to = %order.status,
        "Order status set"
    );
    Ok(Json(OrderDetail::new(&state, order)))
}

/// Permanently delete an order.
///
/// Cancelling is the normal way to void an order; deletion removes it from
/// revenue and history and so requires `?confirm=true`.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<Deleted>> {
    if !query.confirm {
        return Err(AppError::BadRequest(
            "Deleting an order is permanent; repeat with confirm=true".to_string(),
        ));
    }

    let deleted = lifecycle::delete_order(state.store(), &id).await?;
    tracing::info!(admin = %admin.email, order_id = %id, deleted, "Order delete requested");
    Ok(Json(Deleted { deleted }))
}
