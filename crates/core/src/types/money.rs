//! Monetary amounts with decimal-safe arithmetic.

use core::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount in the store's single currency.
///
/// Backed by [`rust_decimal::Decimal`], so cart arithmetic is exact: sums
/// and percentage discounts never accumulate binary floating-point error.
/// Rounding to whole cents happens only at the boundaries - display and
/// order submission - via [`Money::round_to_cents`].
///
/// On the wire a `Money` is a plain JSON number.
///
/// ## Examples
///
/// ```
/// use cartwheel_core::Money;
///
/// let price = Money::from_cents(19_99);
/// assert_eq!(price.to_string(), "$19.99");
/// assert_eq!((price * 3).to_string(), "$59.97");
///
/// // Subtraction clamps at zero rather than going negative.
/// let small = Money::from_cents(5_00);
/// let large = Money::from_cents(8_00);
/// assert_eq!(small.saturating_sub(large), Money::ZERO);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a monetary amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a monetary amount from whole cents (e.g., `1999` -> `$19.99`).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to whole cents, midpoints away from zero (`$2.345` -> `$2.35`).
    ///
    /// Intermediate cart math stays unrounded; apply this at display and
    /// order-submission boundaries.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Subtract, clamping at zero.
    ///
    /// A discount larger than the subtotal yields a free cart, never a
    /// negative total.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Take a percentage of this amount (`$200.00`, `10` -> `$20.00`).
    #[must_use]
    pub fn percent(self, percentage: Decimal) -> Self {
        Self(self.0 * percentage / Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.round_to_cents().0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(19_99).amount(), Decimal::new(1999, 2));
        assert_eq!(Money::from_cents(0), Money::ZERO);
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Money::from_cents(5_00).to_string(), "$5.00");
        assert_eq!(Money::from_cents(19_90).to_string(), "$19.90");
    }

    #[test]
    fn test_round_to_cents_midpoint_away_from_zero() {
        let amount = Money::new(Decimal::new(2_345, 3)); // 2.345
        assert_eq!(amount.round_to_cents(), Money::from_cents(2_35));

        let amount = Money::new(Decimal::new(2_344, 3)); // 2.344
        assert_eq!(amount.round_to_cents(), Money::from_cents(2_34));
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let five = Money::from_cents(5_00);
        let ten = Money::from_cents(10_00);
        assert_eq!(five.saturating_sub(ten), Money::ZERO);
        assert_eq!(ten.saturating_sub(five), Money::from_cents(5_00));
        assert_eq!(ten.saturating_sub(ten), Money::ZERO);
    }

    #[test]
    fn test_percent() {
        let subtotal = Money::from_cents(100_00);
        assert_eq!(subtotal.percent(Decimal::from(10)), Money::from_cents(10_00));
        assert_eq!(subtotal.percent(Decimal::from(15)), Money::from_cents(15_00));
    }

    #[test]
    fn test_mul_by_quantity() {
        assert_eq!(Money::from_cents(19_99) * 3, Money::from_cents(59_97));
        assert_eq!(Money::from_cents(19_99) * 0, Money::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(1_00), Money::from_cents(2_50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(3_50));
    }

    #[test]
    fn test_serde_as_json_number() {
        let money = Money::from_cents(19_99);
        assert_eq!(serde_json::to_string(&money).unwrap(), "19.99");

        let parsed: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(parsed, money);

        // Integer-valued prices are numbers too
        let parsed: Money = serde_json::from_str("20").unwrap();
        assert_eq!(parsed, Money::from_cents(20_00));
    }
}
