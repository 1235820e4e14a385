//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (public)
//! POST   /auth/login                 - Log in with email and password
//! POST   /auth/logout                - End the session
//! GET    /auth/me                    - The logged-in operator
//!
//! # Everything below requires an admin session
//! GET    /api/dashboard              - Counts, revenue and recent orders
//!
//! GET    /api/products               - List products
//! POST   /api/products               - Create a product
//! GET    /api/products/{id}          - Product detail
//! PATCH  /api/products/{id}          - Partial update
//! DELETE /api/products/{id}          - Delete a product
//! POST   /api/products/import        - JSON/CSV import (?format=, ?commit=)
//!
//! GET    /api/categories             - List categories
//! POST   /api/categories             - Create a category
//! PATCH  /api/categories/{id}        - Rename or re-parent
//! DELETE /api/categories/{id}        - Delete a category
//!
//! GET    /api/orders                 - List orders (?status=)
//! GET    /api/orders/{id}            - Order detail with next statuses
//! DELETE /api/orders/{id}            - Permanent delete (?confirm=true)
//! POST   /api/orders/{id}/status     - Change status
//!
//! GET    /api/settings               - Store settings
//! PUT    /api/settings               - Replace store settings
//!
//! GET    /api/backup                 - Download a full backup
//! POST   /api/backup/restore         - Destructive restore (?confirm=true)
//! ```

pub mod auth;
pub mod backup;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Upload limit for imports and restores.
const UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// Login and logout.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Product routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::delete),
        )
        .route(
            "/import",
            post(products::import_products).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
}

/// Category routes.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            axum::routing::patch(categories::update).delete(categories::delete),
        )
}

/// Order routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show).delete(orders::delete))
        .route("/{id}/status", post(orders::update_status))
}

/// Everything behind the admin session.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .route("/settings", get(settings::show).put(settings::update))
        .route("/backup", get(backup::export))
        .route(
            "/backup/restore",
            post(backup::restore).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route_layer(axum::middleware::from_extractor::<RequireAdminAuth>())
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_state;

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let (state, _store) = test_state();
        let app = routes().with_state(state);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_api_requires_admin_session() {
        assert_eq!(status_of("GET", "/api/dashboard").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/api/orders").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/api/backup").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/auth/me").await, StatusCode::UNAUTHORIZED);
    }
}
