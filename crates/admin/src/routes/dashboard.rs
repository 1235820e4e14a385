//! Dashboard summary.

use axum::{Json, extract::State};
use opal_core::lifecycle::OrderStats;
use opal_core::order::Order;
use opal_core::store::fallback;
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

/// Orders shown in the "recent" list.
const RECENT_ORDERS: usize = 5;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub product_count: usize,
    pub out_of_stock_count: usize,
    pub category_count: usize,
    pub orders: OrderStats,
    /// Revenue formatted with the store's currency symbol.
    pub revenue_display: String,
    pub recent_orders: Vec<Order>,
}

/// Catalog and order figures for the dashboard.
///
/// Reads degrade, so an unreachable store shows zeros.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<Dashboard> {
    let store = state.store();
    let (products, categories, orders, settings) = tokio::join!(
        fallback::products_or_empty(store),
        fallback::categories_or_empty(store),
        fallback::orders_or_empty(store),
        fallback::settings_or_default(store),
    );

    let stats = OrderStats::collect(&orders);
    let revenue_display = settings.format_amount(stats.revenue);

    // Orders come back newest first.
    let recent_orders = orders.into_iter().take(RECENT_ORDERS).collect();

    Json(Dashboard {
        product_count: products.len(),
        out_of_stock_count: products.iter().filter(|p| !p.in_stock).count(),
        category_count: categories.len(),
        orders: stats,
        revenue_display,
        recent_orders,
    })
}
