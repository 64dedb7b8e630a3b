//! Bulk pricing for rice sold by the kilogram.
//!
//! A product carries one base price per kilogram. The price actually charged
//! per kilogram depends on how much is bought at once:
//!
//! | kilograms | factor |
//! |---|---|
//! | 1 | 1.00 |
//! | 2 to 4 | 0.95 |
//! | 5 to 9 | 0.90 |
//! | 10 and above | 0.85 |
//!
//! Band lower bounds are inclusive. Nothing here rounds.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Errors raised when validating pricing input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("base price must be greater than zero (got {0})")]
    NonPositiveBasePrice(Decimal),
    #[error("unknown weight tier: {0}")]
    UnknownTier(String),
}

/// Weight band a customer picks when adding rice to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeightTier {
    #[serde(rename = "1kg")]
    OneKg,
    #[serde(rename = "2-4kg")]
    TwoToFourKg,
    #[serde(rename = "5-9kg")]
    FiveToNineKg,
    #[serde(rename = "10+kg")]
    TenPlusKg,
}

impl WeightTier {
    pub const ALL: [Self; 4] = [
        Self::OneKg,
        Self::TwoToFourKg,
        Self::FiveToNineKg,
        Self::TenPlusKg,
    ];

    /// Band for a purchase of `kg` kilograms. Zero kilograms has no band.
    #[must_use]
    pub const fn for_kilograms(kg: u32) -> Option<Self> {
        match kg {
            0 => None,
            1 => Some(Self::OneKg),
            2..=4 => Some(Self::TwoToFourKg),
            5..=9 => Some(Self::FiveToNineKg),
            _ => Some(Self::TenPlusKg),
        }
    }

    /// Multiplier applied to the base price.
    #[must_use]
    pub fn discount_factor(self) -> Decimal {
        match self {
            Self::OneKg => Decimal::ONE,
            Self::TwoToFourKg => Decimal::new(95, 2),
            Self::FiveToNineKg => Decimal::new(90, 2),
            Self::TenPlusKg => Decimal::new(85, 2),
        }
    }

    /// Smallest quantity in the band, used when a tier is picked directly.
    #[must_use]
    pub const fn representative_kilograms(self) -> u32 {
        match self {
            Self::OneKg => 1,
            Self::TwoToFourKg => 2,
            Self::FiveToNineKg => 5,
            Self::TenPlusKg => 10,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneKg => "1kg",
            Self::TwoToFourKg => "2-4kg",
            Self::FiveToNineKg => "5-9kg",
            Self::TenPlusKg => "10+kg",
        }
    }
}

impl fmt::Display for WeightTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeightTier {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| PricingError::UnknownTier(s.to_owned()))
    }
}

/// A validated per-kilogram base price.
///
/// Construct this at the input boundary (admin product forms, seed files).
/// The calculator functions take a plain [`Price`] and assume it came from
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct BasePrice(Price);

impl BasePrice {
    /// # Errors
    ///
    /// Returns [`PricingError::NonPositiveBasePrice`] for zero or negative amounts.
    pub fn new(amount: Decimal) -> Result<Self, PricingError> {
        if amount <= Decimal::ZERO {
            return Err(PricingError::NonPositiveBasePrice(amount));
        }
        Ok(Self(Price::new(amount)))
    }

    #[must_use]
    pub const fn price(self) -> Price {
        self.0
    }
}

impl TryFrom<Decimal> for BasePrice {
    type Error = PricingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BasePrice> for Decimal {
    fn from(value: BasePrice) -> Self {
        value.0.amount()
    }
}

/// Effective per-kilogram price for `tier`.
#[must_use]
pub fn tier_price(base: Price, tier: WeightTier) -> Price {
    base.scale(tier.discount_factor())
}

/// Effective per-kilogram price when buying `kg` kilograms at once.
///
/// Returns `None` for zero kilograms.
#[must_use]
pub fn price_for_quantity(base: Price, kg: u32) -> Option<Price> {
    WeightTier::for_kilograms(kg).map(|tier| tier_price(base, tier))
}

/// One row of a product's price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierPrice {
    pub tier: WeightTier,
    pub price_per_kg: Price,
}

/// All four tier prices, cheapest band last.
#[must_use]
pub fn price_table(base: Price) -> [TierPrice; 4] {
    WeightTier::ALL.map(|tier| TierPrice {
        tier,
        price_per_kg: tier_price(base, tier),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Price {
        Price::from_rupees(300)
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(WeightTier::for_kilograms(0), None);
        assert_eq!(WeightTier::for_kilograms(1), Some(WeightTier::OneKg));
        assert_eq!(WeightTier::for_kilograms(2), Some(WeightTier::TwoToFourKg));
        assert_eq!(WeightTier::for_kilograms(4), Some(WeightTier::TwoToFourKg));
        assert_eq!(WeightTier::for_kilograms(5), Some(WeightTier::FiveToNineKg));
        assert_eq!(WeightTier::for_kilograms(9), Some(WeightTier::FiveToNineKg));
        assert_eq!(WeightTier::for_kilograms(10), Some(WeightTier::TenPlusKg));
        assert_eq!(WeightTier::for_kilograms(250), Some(WeightTier::TenPlusKg));
    }

    #[test]
    fn test_prices_per_band() {
        let p = base();
        assert_eq!(price_for_quantity(p, 1).unwrap(), p);
        assert_eq!(price_for_quantity(p, 3).unwrap(), Price::from_rupees(285));
        assert_eq!(price_for_quantity(p, 7).unwrap(), Price::from_rupees(270));
        assert_eq!(price_for_quantity(p, 12).unwrap(), Price::from_rupees(255));
        assert_ne!(price_for_quantity(p, 4), price_for_quantity(p, 5));
    }

    #[test]
    fn test_no_rounding() {
        let p = Price::new(Decimal::new(33_333, 2));
        // 333.33 * 0.95
        assert_eq!(
            tier_price(p, WeightTier::TwoToFourKg).amount(),
            Decimal::new(3_166_635, 4)
        );
    }

    #[test]
    fn test_representative_kilograms_land_in_their_band() {
        for tier in WeightTier::ALL {
            assert_eq!(
                WeightTier::for_kilograms(tier.representative_kilograms()),
                Some(tier)
            );
        }
    }

    #[test]
    fn test_tier_wire_names() {
        assert_eq!(serde_json::to_string(&WeightTier::TenPlusKg).unwrap(), "\"10+kg\"");
        assert_eq!("2-4kg".parse::<WeightTier>().unwrap(), WeightTier::TwoToFourKg);
        assert!("3kg".parse::<WeightTier>().is_err());
    }

    #[test]
    fn test_base_price_rejects_non_positive() {
        assert!(BasePrice::new(Decimal::ZERO).is_err());
        assert!(BasePrice::new(Decimal::new(-5, 0)).is_err());
        assert_eq!(
            BasePrice::new(Decimal::new(250, 0)).unwrap().price(),
            Price::from_rupees(250)
        );
        assert!(serde_json::from_str::<BasePrice>("\"0\"").is_err());
    }

    #[test]
    fn test_price_table() {
        let table = price_table(base());
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].price_per_kg, Price::from_rupees(300));
        assert_eq!(table[3].price_per_kg, Price::from_rupees(255));
    }
}
