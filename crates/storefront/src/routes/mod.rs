//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /api/products           - Product listing (title order)
//! GET  /api/products/{id}      - Product detail
//! GET  /api/categories         - Category tree
//! GET  /api/settings           - Shipping and currency settings
//!
//! # Cart (session-backed)
//! GET  /api/cart               - Priced cart with checkout summary
//! GET  /api/cart/count         - Cart badge count
//! POST /api/cart/add           - Add a product selection
//! POST /api/cart/update        - Set a line's quantity
//! POST /api/cart/remove        - Remove a line
//!
//! # Orders (strict rate limit)
//! POST /api/checkout           - Place an order for the cart
//! GET  /api/orders/track       - Look up an order by number and email
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Catalog browsing routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/categories", get(catalog::categories))
        .route("/settings", get(catalog::settings))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Checkout and tracking routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::place_order))
        .route("/orders/track", get(checkout::track_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes().layer(cart_rate_limiter()))
        .merge(order_routes().layer(checkout_rate_limiter()));

    Router::new().nest("/api", api)
}
