//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Session layer (`admin.session` table; in-memory in tests)
//! 3. `TraceLayer`
//! 4. Request ID
//! 5. Security headers
//! 6. Session guard (everything except the login route)
//! 7. Rate limiting on login

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminSession, GuardDecision, LOGIN_PATH, RequireAdminAuth, admin_guard_middleware,
    clear_current_admin, set_current_admin,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
