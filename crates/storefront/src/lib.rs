//! Yousuf Rice Storefront library.
//!
//! The public shop API: catalog, session cart, cash-on-delivery checkout and
//! analytics beacons. Exposed as a library so the router can be driven
//! in-process by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the storefront router with its per-request middleware.
///
/// Sessions are not attached here: the binary adds the `PostgreSQL` session
/// layer, tests add an in-memory one.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
