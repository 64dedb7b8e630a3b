//! Business logic services for the storefront.
//!
//! - `catalog` - Cached active product list and lookups
//! - `cart` - Session-backed cart persistence
//! - `checkout` - Order placement
//! - `analytics` - Fire-and-forget event tracking

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use analytics::AnalyticsTracker;
pub use cart::CartStore;
pub use catalog::{Catalog, CatalogFilter};
pub use checkout::{OrderComposer, PlacedOrder};
