//! Pure cart pricing arithmetic.
//!
//! All functions are stateless and decimal-exact: no rounding happens
//! here. Callers round with [`Money::round_to_cents`] exactly twice in a
//! cart's life - when rendering and when submitting an order.

use cartwheel_core::Money;
use rust_decimal::Decimal;

use super::CartLine;

/// Sum of `unit_price x quantity` over all lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_total).sum()
}

/// Discount amount for a percentage promo on the given subtotal.
///
/// The percentage is applied to the *current* subtotal, so the result
/// tracks line changes instead of going stale.
#[must_use]
pub fn discount(subtotal: Money, percentage: Decimal) -> Money {
    subtotal.percent(percentage)
}

/// Grand total: subtotal minus discount, clamped at zero.
#[must_use]
pub fn total(subtotal: Money, discount: Money) -> Money {
    subtotal.saturating_sub(discount)
}

/// Total number of items (sum of quantities).
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cartwheel_core::ProductId;

    fn line(id: i64, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            unit_price: Money::from_cents(cents),
            image: None,
            category: "test".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let lines = vec![line(1, 20_00, 2), line(2, 5_50, 3)];
        assert_eq!(subtotal(&lines), Money::from_cents(56_50));
    }

    #[test]
    fn test_subtotal_of_empty_cart_is_zero() {
        assert_eq!(subtotal(&[]), Money::ZERO);
    }

    #[test]
    fn test_ten_percent_discount_on_one_hundred() {
        let sub = Money::from_cents(100_00);
        let disc = discount(sub, Decimal::from(10));
        assert_eq!(disc, Money::from_cents(10_00));
        assert_eq!(total(sub, disc), Money::from_cents(90_00));
    }

    #[test]
    fn test_total_never_negative() {
        // A discount larger than the subtotal clamps to zero rather
        // than producing a negative total.
        let sub = Money::from_cents(10_00);
        let disc = Money::from_cents(25_00);
        assert_eq!(total(sub, disc), Money::ZERO);
    }

    #[test]
    fn test_item_count_is_order_independent() {
        let forward = vec![line(1, 10_00, 2), line(2, 5_00, 7), line(3, 1_00, 1)];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(item_count(&forward), 10);
        assert_eq!(item_count(&forward), item_count(&reversed));
    }

    #[test]
    fn test_discount_is_exact_before_rounding() {
        // 15% of $19.99 is $2.9985; the pricing layer keeps full
        // precision and lets the caller round at the edge.
        let sub = Money::from_cents(19_99);
        let disc = discount(sub, Decimal::from(15));
        assert_eq!(disc.round_to_cents(), Money::from_cents(3_00));
        assert_eq!(total(sub, disc).round_to_cents(), Money::from_cents(16_99));
    }
}
