//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Session layer (added in `main`, in-memory store in tests)
//! 3. `TraceLayer`
//! 4. Request ID
//! 5. Security headers
//! 6. Rate limiting on checkout and event routes

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod visitor;

pub use rate_limit::{checkout_rate_limiter, events_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use visitor::Visitor;
