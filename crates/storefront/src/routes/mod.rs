//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /products                   - Active products (?category=, ?q=)
//! GET    /products/categories        - Distinct categories
//! GET    /products/{id}              - Product detail with tier prices
//!
//! # Cart (session-backed)
//! GET    /cart                       - Cart with totals
//! POST   /cart/items                 - Add a product at a weight tier
//! PATCH  /cart/items/{line_id}       - Set quantity (<= 0 removes)
//! DELETE /cart/items/{line_id}       - Remove a line
//! DELETE /cart                       - Empty the cart
//! GET    /cart/count                 - Item count
//!
//! # Checkout
//! GET    /checkout/summary           - Subtotal, delivery fee, total
//! POST   /checkout                   - Place a cash-on-delivery order
//!
//! # Analytics
//! POST   /events/page-view           - Page view beacon
//! ```
//!
//! `/health` and `/health/ready` are mounted by the binary.

pub mod cart;
pub mod checkout;
pub mod events;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{checkout_rate_limiter, events_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route(
            "/items/{line_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .layer(checkout_rate_limiter())
        .route("/summary", get(checkout::summary))
}

/// Create the analytics beacon routes router.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/page-view", post(events::page_view))
        .layer(events_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/events", event_routes())
}
