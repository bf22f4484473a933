//! Monetary amounts.
//!
//! All amounts are in rupees using decimal arithmetic. The backend sends
//! plain JSON numbers; `Decimal` accepts both numbers and strings and
//! serializes as a string so no precision is lost on the way back out.

use rust_decimal::{Decimal, RoundingStrategy};

/// An amount in rupees.
pub type Money = Decimal;

/// Highest unit price accepted from a client (one crore).
pub const MAX_UNIT_PRICE: Money = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Whether a client-supplied unit price is usable: not negative and not
/// above [`MAX_UNIT_PRICE`].
#[must_use]
pub fn is_valid_unit_price(price: Money) -> bool {
    price >= Money::ZERO && price <= MAX_UNIT_PRICE
}

/// Format an amount for display (e.g., "₹49.50"). Halves round up.
#[must_use]
pub fn display_amount(amount: Money) -> String {
    format!(
        "₹{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_amount() {
        assert_eq!(display_amount(Decimal::new(4950, 2)), "₹49.50");
        assert_eq!(display_amount(Decimal::from(40)), "₹40.00");
        assert_eq!(display_amount(Decimal::new(12_345, 3)), "₹12.35");
        assert_eq!(display_amount(Decimal::new(12_355, 3)), "₹12.36");
    }

    #[test]
    fn test_unit_price_bounds() {
        assert!(is_valid_unit_price(Decimal::ZERO));
        assert!(is_valid_unit_price(MAX_UNIT_PRICE));
        assert!(!is_valid_unit_price(Decimal::new(-1, 2)));
        assert!(!is_valid_unit_price(MAX_UNIT_PRICE + Decimal::ONE));
        assert!(!is_valid_unit_price(Decimal::MAX));
    }
}
