//! Session-backed cart persistence.
//!
//! The cart is read from the session at the start of each request and
//! written back after every mutation. Only the lines are stored; totals are
//! recomputed from them on every read.

use tower_sessions::Session;
use yousuf_rice_core::cart::Cart;

use crate::models::session_keys;

/// Loads and saves the shopper's [`Cart`].
#[derive(Clone)]
pub struct CartStore {
    session: Session,
}

impl CartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The stored cart, or an empty one.
    ///
    /// A record that no longer deserializes is logged, dropped, and treated
    /// as an empty cart.
    pub async fn load(&self) -> Cart {
        match self.session.get::<Cart>(session_keys::CART).await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cart");
                if let Err(e) = self.session.remove_value(session_keys::CART).await {
                    tracing::warn!(error = %e, "Failed to remove unreadable cart");
                }
                Cart::new()
            }
        }
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns the session error if the record cannot be written.
    pub async fn save(&self, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::CART, cart).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tower_sessions::MemoryStore;
    use yousuf_rice_core::cart::ProductSnapshot;
    use yousuf_rice_core::pricing::WeightTier;
    use yousuf_rice_core::{Price, ProductId};

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_round_trip_recomputes_totals() {
        let store = CartStore::new(session());
        assert!(store.load().await.is_empty());

        let mut cart = Cart::new();
        let product = ProductSnapshot {
            id: ProductId::new("sella"),
            name: "Golden Sella".to_owned(),
            category: "Sella".to_owned(),
            image_url: None,
        };
        cart.add_item(&product, Price::from_rupees(300), WeightTier::OneKg, 3)
            .unwrap();
        store.save(&cart).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, cart);
        assert_eq!(loaded.total(), Price::from_rupees(900));
        assert_eq!(loaded.item_count(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_cart_becomes_empty() {
        let session = session();
        session
            .insert(session_keys::CART, json!({"lines": "not a list"}))
            .await
            .unwrap();

        let store = CartStore::new(session.clone());
        assert!(store.load().await.is_empty());
        assert!(
            session
                .get_value(session_keys::CART)
                .await
                .unwrap()
                .is_none()
        );
    }
}
