//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are Pakistani rupees. Arithmetic never rounds; rounding to
//! two decimals happens only in [`Price`]'s `Display` implementation.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rupee amount.
///
/// Serialized as a decimal string (`"1234.50"`) so no precision is lost on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiply by a decimal factor (used for discount bands).
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{:.2}", rounded.abs());
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        // Group the whole part in thousands: 12345 -> 12,345
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        write!(f, "{sign}Rs. {grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_rupees(1_234_567).to_string(), "Rs. 1,234,567.00");
        assert_eq!(Price::from_rupees(150).to_string(), "Rs. 150.00");
        assert_eq!(Price::ZERO.to_string(), "Rs. 0.00");
    }

    #[test]
    fn test_display_rounds_only_for_presentation() {
        let price = Price::new(Decimal::new(28_025, 2)).scale(Decimal::new(95, 2));
        // 280.25 * 0.95 = 266.2375
        assert_eq!(price.amount(), Decimal::new(2_662_375, 4));
        assert_eq!(price.to_string(), "Rs. 266.24");
    }

    #[test]
    fn test_arithmetic() {
        let unit = Price::from_rupees(250);
        assert_eq!(unit * 3, Price::from_rupees(750));
        assert_eq!(unit + unit, Price::from_rupees(500));
        let total: Price = [unit, unit, Price::from_rupees(10)].into_iter().sum();
        assert_eq!(total, Price::from_rupees(510));
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Price::new(Decimal::new(12_050, 2))).ok();
        assert_eq!(json.as_deref(), Some("\"120.50\""));
    }
}
