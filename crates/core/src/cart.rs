//! The shopping cart aggregate.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s, unique by product and
//! weight tier. Totals are never stored: [`Cart::total`] and
//! [`Cart::item_count`] are computed from the lines every time, and the
//! serialized form only carries the lines.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::pricing::{WeightTier, tier_price};
use crate::types::{Price, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("cart line not found: {0}")]
    LineNotFound(LineId),
}

/// Stable identifier of a cart line: `"{product_id}:{tier}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    #[must_use]
    pub fn for_line(product_id: &ProductId, tier: WeightTier) -> Self {
        Self(format!("{product_id}:{tier}"))
    }

    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a cart line remembers about the product it was created from.
///
/// Later catalog edits do not reach into carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub product: ProductSnapshot,
    pub tier: WeightTier,
    pub quantity: u32,
    /// Per-kg price captured when the line was created.
    pub unit_price: Price,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// The shopping cart.
///
/// Invariants: every line has `quantity >= 1`, and no two lines share a
/// product and tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    lines: Vec<CartLine>,
}

// Rehydration path. Lines are taken as stored except those that would break
// the quantity invariant.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Self::new();
        for line in stored.lines.into_iter().filter(|l| l.quantity > 0) {
            if !cart.lines.iter().any(|l| l.id == line.id) {
                cart.lines.push(line);
            }
        }
        cart
    }
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// Add `quantity` of `product` at `tier`.
    ///
    /// If a line for the same product and tier exists its quantity grows and
    /// its captured price is kept. Otherwise a new line is appended, priced
    /// from `base_price`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] when `quantity` is zero.
    pub fn add_item(
        &mut self,
        product: &ProductSnapshot,
        base_price: Price,
        tier: WeightTier,
        quantity: u32,
    ) -> Result<&CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let id = LineId::for_line(&product.id, tier);
        let index = match self.lines.iter().position(|l| l.id == id) {
            Some(index) => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = line.quantity.saturating_add(quantity);
                }
                index
            }
            None => {
                self.lines.push(CartLine {
                    id: id.clone(),
                    product: product.clone(),
                    tier,
                    quantity,
                    unit_price: tier_price(base_price, tier),
                });
                self.lines.len() - 1
            }
        };

        self.lines.get(index).ok_or(CartError::LineNotFound(id))
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] for an unknown line id.
    pub fn update_quantity(&mut self, id: &LineId, quantity: i64) -> Result<(), CartError> {
        let Some(index) = self.lines.iter().position(|l| &l.id == id) else {
            return Err(CartError::LineNotFound(id.clone()));
        };

        if quantity <= 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn basmati() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("basmati"),
            name: "Super Kernel Basmati".to_owned(),
            category: "Basmati".to_owned(),
            image_url: None,
        }
    }

    fn sella() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("sella"),
            name: "Golden Sella".to_owned(),
            category: "Sella".to_owned(),
            image_url: None,
        }
    }

    #[test]
    fn test_add_merges_and_keeps_first_price() {
        let mut cart = Cart::new();
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 2)
            .unwrap();
        // Catalog price changed between adds
        cart.add_item(&basmati(), Price::from_rupees(400), WeightTier::OneKg, 3)
            .unwrap();

        assert_eq!(cart.lines().len(), 1);
        let line = &cart.lines()[0];
        assert_eq!(line.quantity, 5);
        assert_eq!(line.unit_price, Price::from_rupees(300));
        assert_eq!(cart.total(), Price::from_rupees(1500));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_same_product_different_tier_is_separate_line() {
        let mut cart = Cart::new();
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 1)
            .unwrap();
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::TenPlusKg, 1)
            .unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[1].unit_price, Price::from_rupees(255));
        assert_eq!(cart.lines()[1].id.as_str(), "basmati:10+kg");
    }

    #[test]
    fn test_zero_quantity_add_rejected() {
        let mut cart = Cart::new();
        let err = cart
            .add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 0)
            .unwrap_err();
        assert_eq!(err, CartError::ZeroQuantity);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let mut cart = Cart::new();
        let id = cart
            .add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 2)
            .unwrap()
            .id
            .clone();

        cart.update_quantity(&id, 7).unwrap();
        assert_eq!(cart.item_count(), 7);

        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_update_quantity_negative_removes_line() {
        let mut cart = Cart::new();
        let id = LineId::for_line(&basmati().id, WeightTier::OneKg);
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 2)
            .unwrap();
        cart.update_quantity(&id, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        let err = cart.update_quantity(&LineId::new("nope"), 1).unwrap_err();
        assert!(matches!(err, CartError::LineNotFound(_)));
    }

    #[test]
    fn test_remove_only_line_zeroes_totals() {
        let mut cart = Cart::new();
        let id = LineId::for_line(&sella().id, WeightTier::FiveToNineKg);
        cart.add_item(&sella(), Price::from_rupees(200), WeightTier::FiveToNineKg, 5)
            .unwrap();

        assert!(cart.remove_item(&id));
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert!(!cart.remove_item(&id));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&sella(), Price::from_rupees(200), WeightTier::OneKg, 1)
            .unwrap();
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::OneKg, 1)
            .unwrap();
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_rehydrated_totals_are_recomputed() {
        let mut cart = Cart::new();
        cart.add_item(&basmati(), Price::from_rupees(300), WeightTier::TwoToFourKg, 3)
            .unwrap();
        cart.add_item(&sella(), Price::from_rupees(210), WeightTier::TenPlusKg, 2)
            .unwrap();
        let id = LineId::for_line(&basmati().id, WeightTier::TwoToFourKg);
        cart.update_quantity(&id, 4).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.get("total").is_none());

        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.total(), cart.total());
        assert_eq!(restored.item_count(), 6);
    }

    #[test]
    fn test_rehydration_drops_zero_quantity_lines() {
        let json = serde_json::json!({
            "lines": [{
                "id": "basmati:1kg",
                "product": { "id": "basmati", "name": "Basmati", "category": "Basmati" },
                "tier": "1kg",
                "quantity": 0,
                "unit_price": "300"
            }]
        });
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert!(cart.is_empty());
    }
}
