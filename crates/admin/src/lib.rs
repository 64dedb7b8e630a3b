//! Yousuf Rice Admin library.
//!
//! The staff panel API: sign-in, dashboard, order management, product
//! management with image upload and the analytics read side. Exposed as a
//! library so the router can be driven in-process by tests.
//!
//! # Security
//!
//! This crate holds an Appwrite API key with write access to every table
//! and the image bucket. Every route except the login route requires a
//! signed-in admin.

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
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the admin router with its per-request middleware.
///
/// The session guard runs inside the session layer, which the caller adds:
/// the binary uses the `PostgreSQL` store, tests an in-memory one.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(from_fn(middleware::admin_guard_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
