//! Session-stored storefront state.
//!
//! A shopper's cart and analytics visitor id live in their server-side
//! session record, keyed by the `yr_session` cookie.

/// Session keys for storefront data.
pub mod session_keys {
    /// The serialized [`yousuf_rice_core::cart::Cart`].
    pub const CART: &str = "cart";

    /// The analytics visitor id, created on first sight.
    pub const VISITOR_ID: &str = "visitor_id";
}
