//! Decimal aliases for prices, quantities and profit bookkeeping.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Order or position quantity.
pub type Quantity = Decimal;

/// Realized or protected profit in quote currency.
pub type Profit = Decimal;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn notional_is_exact() {
        let price: Price = dec!(64250.10);
        let quantity: Quantity = dec!(0.003);

        assert_eq!(price * quantity, dec!(192.75030));
    }

    #[test]
    fn profit_accumulates_without_drift() {
        let mut total: Profit = Decimal::ZERO;
        for _ in 0..10 {
            total += dec!(0.1);
        }
        assert_eq!(total, dec!(1.0));
    }
}
