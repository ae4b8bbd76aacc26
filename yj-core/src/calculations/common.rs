//! Shared rounding helpers for money and rate values.

use rust_decimal::Decimal;

/// Rounds a money value to exactly two decimal places, half-up.
///
/// Values at exactly 0.005 round away from zero, the standard
/// financial convention.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use yj_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(57.495)), dec!(57.50));
/// assert_eq!(round_half_up(dec!(57.494)), dec!(57.49));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate (a fraction, not money) to four decimal places, half-up.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(39.005)), dec!(39.01));
    }

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(39.004)), dec!(39.00));
    }

    #[test]
    fn round_half_up_preserves_already_rounded_values() {
        assert_eq!(round_half_up(dec!(39.00)), dec!(39.00));
    }

    #[test]
    fn round_rate_keeps_four_places() {
        assert_eq!(round_rate(dec!(0.151333)), dec!(0.1513));
        assert_eq!(round_rate(dec!(0.02)), dec!(0.02));
    }
}
