//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET    /auth/login                   - Session status (never guarded)
//! POST   /auth/login                   - Sign in (rate limited)
//! POST   /auth/logout                  - Sign out
//! GET    /auth/me                      - Signed-in admin
//!
//! # Dashboard
//! GET    /api/dashboard                - Headline numbers and recent orders
//!
//! # Orders
//! GET    /api/orders                   - Orders (?q=, ?status=)
//! GET    /api/orders/{id}              - Order with items
//! POST   /api/orders/{id}/status       - Change status
//!
//! # Products
//! GET    /api/products                 - All products (?q=)
//! POST   /api/products                 - Create (multipart)
//! PUT    /api/products/{id}            - Update (multipart)
//! DELETE /api/products/{id}            - Delete with image
//!
//! # Analytics
//! GET    /api/analytics                - Summary and recent events
//! GET    /api/analytics/summary        - Summary (?start=, ?end=)
//! GET    /api/analytics/events/recent  - Newest events (?limit=)
//! ```
//!
//! `/health` and `/health/ready` are mounted by the binary.

pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::{LOGIN_PATH, login_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, post(auth::login))
        .layer(login_rate_limiter())
        .route(LOGIN_PATH, get(auth::status))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", put(products::update).delete(products::delete))
        .layer(DefaultBodyLimit::max(products::MAX_FORM_BYTES))
}

/// Create the analytics routes router.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(analytics::overview))
        .route("/summary", get(analytics::summary))
        .route("/events/recent", get(analytics::recent))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .route("/api/dashboard", get(dashboard::index))
        .nest("/api/orders", order_routes())
        .nest("/api/products", product_routes())
        .nest("/api/analytics", analytics_routes())
}
