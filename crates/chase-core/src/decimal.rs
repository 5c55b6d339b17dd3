//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors critical in financial calculations.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

/// Number of fraction digits the exchange accepts for limit prices.
pub const PRICE_WIRE_DP: u32 = 8;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with quantities in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Scale the price by `(1 - fraction)`.
    ///
    /// Used both for the chase trigger (`price_delta`) and the
    /// replacement undercut (`limit_depth`).
    #[inline]
    pub fn discounted(&self, fraction: Decimal) -> Self {
        Self(self.0 * (Decimal::ONE - fraction))
    }

    /// Truncate towards zero to the wire precision.
    ///
    /// Rounding down keeps a computed sell price at or below the value it
    /// was derived from.
    #[inline]
    pub fn truncate_to_wire(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(PRICE_WIRE_DP, RoundingStrategy::ToZero),
        )
    }

    /// Render with exactly eight fraction digits, e.g. `97.51000000`.
    pub fn to_wire(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(PRICE_WIRE_DP, RoundingStrategy::MidpointNearestEven);
        format!("{:.8}", rounded)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Quantity of the base asset with exact decimal precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(pub Decimal);

impl Quantity {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole units available for submission (fractional units are dropped).
    ///
    /// Returns `None` for negative quantities or values beyond `u64`.
    #[inline]
    pub fn whole_units(&self) -> Option<u64> {
        self.0.floor().to_u64()
    }

    /// Subtract a fill, never going below zero.
    #[inline]
    pub fn saturating_sub(&self, filled: Quantity) -> Self {
        Self((self.0 - filled.0).max(Decimal::ZERO))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Quantity {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_discounted() {
        let price = Price::new(dec!(100));
        assert_eq!(price.discounted(dec!(0.01)), Price::new(dec!(99)));
    }

    #[test]
    fn test_price_to_wire_pads_to_eight_digits() {
        assert_eq!(Price::new(dec!(97.51)).to_wire(), "97.51000000");
        assert_eq!(Price::new(dec!(100)).to_wire(), "100.00000000");
    }

    #[test]
    fn test_price_to_wire_rounds_excess_digits() {
        assert_eq!(
            Price::new(dec!(0.123456789)).to_wire(),
            "0.12345679"
        );
    }

    #[test]
    fn test_price_truncate_to_wire() {
        let price = Price::new(dec!(1.999999999));
        assert_eq!(price.truncate_to_wire().inner(), dec!(1.99999999));
    }

    #[test]
    fn test_quantity_whole_units_floors() {
        assert_eq!(Quantity::new(dec!(12.9)).whole_units(), Some(12));
        assert_eq!(Quantity::new(dec!(0.4)).whole_units(), Some(0));
        assert_eq!(Quantity::new(dec!(-1)).whole_units(), None);
    }

    #[test]
    fn test_quantity_saturating_sub() {
        let qty = Quantity::new(dec!(5));
        assert_eq!(qty.saturating_sub(Quantity::new(dec!(2.5))).inner(), dec!(2.5));
        assert_eq!(qty.saturating_sub(Quantity::new(dec!(7))), Quantity::ZERO);
    }
}
