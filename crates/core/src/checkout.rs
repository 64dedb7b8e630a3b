//! Checkout validation and order composition.
//!
//! Everything here is pure: the storefront's order composer runs
//! [`CheckoutForm::validate`] and [`OrderDraft::compose`] before it touches
//! the backend, so a bad form or an empty cart never costs a remote call.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::pricing::WeightTier;
use crate::types::{PhoneError, PhoneNumber, Price, ProductId};

/// Validation failures. `Display` is the message shown to the customer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Please enter your name")]
    MissingName,
    #[error("Please enter your phone number")]
    MissingPhone,
    #[error("Please enter a valid Pakistani mobile number")]
    InvalidPhone(#[source] PhoneError),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter your delivery address")]
    MissingAddress,
    #[error("Please select your area")]
    MissingArea,
    #[error("We do not deliver to {0} yet")]
    UnknownArea(String),
    #[error("Your cart is empty")]
    EmptyCart,
}

/// The delivery areas served, and the city they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceArea {
    city: String,
    areas: Vec<String>,
}

impl ServiceArea {
    /// Areas of Karachi offered at checkout. `Other` lets customers outside
    /// the list still order.
    pub const KARACHI_AREAS: [&'static str; 21] = [
        "Gulshan-e-Iqbal",
        "North Nazimabad",
        "Clifton",
        "Defence (DHA)",
        "Korangi",
        "Malir",
        "Saddar",
        "Karachi Cantonment",
        "Lyari",
        "New Karachi",
        "Orangi Town",
        "Landhi",
        "Shah Faisal Colony",
        "Gulberg",
        "Johar Town",
        "Bahadurabad",
        "Tariq Road",
        "Nazimabad",
        "Federal B Area",
        "Pechs",
        "Other",
    ];

    #[must_use]
    pub fn new(city: impl Into<String>, areas: Vec<String>) -> Self {
        Self {
            city: city.into(),
            areas,
        }
    }

    /// Karachi with the standard area list.
    #[must_use]
    pub fn karachi() -> Self {
        Self::new(
            "Karachi",
            Self::KARACHI_AREAS.iter().map(|a| (*a).to_owned()).collect(),
        )
    }

    /// The standard area list under a different city name.
    #[must_use]
    pub fn with_city(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            ..Self::karachi()
        }
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    #[must_use]
    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    /// Canonical spelling of `area`, matched case-insensitively.
    #[must_use]
    pub fn find(&self, area: &str) -> Option<&str> {
        self.areas
            .iter()
            .find(|a| a.eq_ignore_ascii_case(area))
            .map(String::as_str)
    }
}

impl Default for ServiceArea {
    fn default() -> Self {
        Self::karachi()
    }
}

/// Raw checkout form as submitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A checkout form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<String>,
    pub address: String,
    pub area: String,
    pub city: String,
    pub notes: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl CheckoutForm {
    /// Validate the form against `service_area`.
    ///
    /// Fields are checked in form order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] for the first invalid field.
    pub fn validate(&self, service_area: &ServiceArea) -> Result<ValidatedCheckout, CheckoutError> {
        let name = non_blank(Some(self.name.as_str())).ok_or(CheckoutError::MissingName)?;

        if self.phone.trim().is_empty() {
            return Err(CheckoutError::MissingPhone);
        }
        let phone = PhoneNumber::parse(&self.phone).map_err(CheckoutError::InvalidPhone)?;

        let email = non_blank(self.email.as_deref());
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(CheckoutError::InvalidEmail);
        }

        let address = non_blank(Some(self.address.as_str())).ok_or(CheckoutError::MissingAddress)?;

        let area_input = self.area.trim();
        if area_input.is_empty() {
            return Err(CheckoutError::MissingArea);
        }
        let area = service_area
            .find(area_input)
            .ok_or_else(|| CheckoutError::UnknownArea(area_input.to_owned()))?
            .to_owned();

        Ok(ValidatedCheckout {
            name,
            phone,
            email,
            address,
            area,
            city: service_area.city().to_owned(),
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

/// Delivery charge rule: free from a subtotal threshold, flat fee below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub free_delivery_threshold: Price,
    pub flat_fee: Price,
}

impl DeliveryPolicy {
    #[must_use]
    pub fn fee_for(&self, subtotal: Price) -> Price {
        if subtotal >= self.free_delivery_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            free_delivery_threshold: Price::from_rupees(2000),
            flat_fee: Price::from_rupees(150),
        }
    }
}

/// Amounts shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

impl OrderTotals {
    #[must_use]
    pub fn for_cart(cart: &Cart, policy: &DeliveryPolicy) -> Self {
        let subtotal = cart.total();
        let delivery_fee = policy.fee_for(subtotal);
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

/// One order item to be written, snapshotting the cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub tier: WeightTier,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// Everything the order composer writes, computed from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    pub totals: OrderTotals,
    pub items: Vec<OrderItemDraft>,
}

impl OrderDraft {
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no lines.
    pub fn compose(cart: &Cart, policy: &DeliveryPolicy) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = cart
            .lines()
            .iter()
            .map(|line| OrderItemDraft {
                product_id: line.product.id.clone(),
                product_name: line.product.name.clone(),
                tier: line.tier,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total(),
            })
            .collect();

        Ok(Self {
            totals: OrderTotals::for_cart(cart, policy),
            items,
        })
    }
}

/// Human-friendly order reference shown after checkout.
///
/// Cosmetic only; the backend's document id identifies the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// `YR` + last six digits of `timestamp_millis` + `random` padded to
    /// three digits. `random` is taken modulo 1000.
    #[must_use]
    pub fn generate(timestamp_millis: i64, random: u16) -> Self {
        let millis = timestamp_millis.unsigned_abs() % 1_000_000;
        Self(format!("YR{millis:06}{:03}", random % 1000))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::ProductSnapshot;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Ayesha Khan".to_owned(),
            phone: "0300-1234567".to_owned(),
            email: None,
            address: "House 12, Block 5".to_owned(),
            area: "Clifton".to_owned(),
            notes: Some("  ".to_owned()),
        }
    }

    fn cart_with_subtotal(rupees: i64) -> Cart {
        let mut cart = Cart::new();
        let product = ProductSnapshot {
            id: ProductId::new("basmati"),
            name: "Basmati".to_owned(),
            category: "Basmati".to_owned(),
            image_url: None,
        };
        cart.add_item(&product, Price::from_rupees(rupees), WeightTier::OneKg, 1)
            .unwrap();
        cart
    }

    #[test]
    fn test_valid_form() {
        let checkout = form().validate(&ServiceArea::karachi()).unwrap();
        assert_eq!(checkout.phone.as_str(), "+923001234567");
        assert_eq!(checkout.city, "Karachi");
        assert_eq!(checkout.area, "Clifton");
        assert_eq!(checkout.notes, None);
    }

    #[test]
    fn test_first_failure_wins() {
        let areas = ServiceArea::karachi();
        let mut f = form();
        f.name = "   ".to_owned();
        f.phone = "123".to_owned();
        assert_eq!(f.validate(&areas).unwrap_err(), CheckoutError::MissingName);
    }

    #[test]
    fn test_phone_errors() {
        let areas = ServiceArea::karachi();
        let mut f = form();
        f.phone = String::new();
        assert_eq!(f.validate(&areas).unwrap_err(), CheckoutError::MissingPhone);

        f.phone = "03001234".to_owned();
        let err = f.validate(&areas).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPhone(_)));
        assert_eq!(err.to_string(), "Please enter a valid Pakistani mobile number");
    }

    #[test]
    fn test_address_area_and_email() {
        let areas = ServiceArea::karachi();

        let mut f = form();
        f.address = String::new();
        assert_eq!(f.validate(&areas).unwrap_err(), CheckoutError::MissingAddress);

        let mut f = form();
        f.area = String::new();
        assert_eq!(f.validate(&areas).unwrap_err(), CheckoutError::MissingArea);

        let mut f = form();
        f.area = "Hyderabad".to_owned();
        assert!(matches!(
            f.validate(&areas).unwrap_err(),
            CheckoutError::UnknownArea(_)
        ));

        let mut f = form();
        f.area = "defence (dha)".to_owned();
        assert_eq!(f.validate(&areas).unwrap().area, "Defence (DHA)");

        let mut f = form();
        f.email = Some("not-an-email".to_owned());
        assert_eq!(f.validate(&areas).unwrap_err(), CheckoutError::InvalidEmail);
    }

    #[test]
    fn test_service_city_is_configurable() {
        let checkout = form().validate(&ServiceArea::with_city("Hyderabad")).unwrap();
        assert_eq!(checkout.city, "Hyderabad");
    }

    #[test]
    fn test_delivery_fee_threshold() {
        let policy = DeliveryPolicy::default();
        assert_eq!(policy.fee_for(Price::from_rupees(2000)), Price::ZERO);
        assert_eq!(policy.fee_for(Price::from_rupees(2001)), Price::ZERO);
        assert_eq!(policy.fee_for(Price::from_rupees(1999)), Price::from_rupees(150));
        assert_eq!(
            policy.fee_for(Price::new(Decimal::new(199_999, 2))),
            Price::from_rupees(150)
        );
    }

    #[test]
    fn test_compose_empty_cart_rejected() {
        let err = OrderDraft::compose(&Cart::new(), &DeliveryPolicy::default()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn test_compose_totals_and_items() {
        let draft =
            OrderDraft::compose(&cart_with_subtotal(500), &DeliveryPolicy::default()).unwrap();
        assert_eq!(draft.totals.subtotal, Price::from_rupees(500));
        assert_eq!(draft.totals.delivery_fee, Price::from_rupees(150));
        assert_eq!(draft.totals.total, Price::from_rupees(650));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].product_name, "Basmati");
        assert_eq!(draft.items[0].line_total, Price::from_rupees(500));

        let free = OrderDraft::compose(&cart_with_subtotal(2000), &DeliveryPolicy::default())
            .unwrap();
        assert_eq!(free.totals.total, Price::from_rupees(2000));
    }

    #[test]
    fn test_order_number_format() {
        let number = OrderNumber::generate(1_718_000_123_456, 7);
        assert_eq!(number.as_str(), "YR123456007");

        let short = OrderNumber::generate(42, 999);
        assert_eq!(short.as_str(), "YR000042999");
    }
}
