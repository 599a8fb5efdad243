use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::types::{Money, Rate};

/// Compute `factor^n` via iterative multiplication (avoids Decimal::powd drift).
///
/// Saturates at `Decimal::MAX` / `Decimal::MIN` with the sign of the true power.
pub fn compound(factor: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.saturating_mul(factor);
    }
    result
}

/// Whether a value has been clamped to the edge of the Decimal range.
pub fn is_saturated(value: Decimal) -> bool {
    value == Decimal::MAX || value == Decimal::MIN
}

/// `numerator / denominator` clamped to the Decimal range. `denominator` must
/// be non-zero.
pub fn saturating_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or({
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

/// Real `n`-th root of a non-negative value.
///
/// `0`, `1` and `n <= 1` are returned unchanged so that flat and single-step
/// paths stay exact; everything else goes through `powd`.
pub fn nth_root(value: Decimal, n: u32) -> Decimal {
    debug_assert!(value >= Decimal::ZERO, "nth_root of a negative value");
    if n <= 1 || value.is_zero() || value == Decimal::ONE {
        return value;
    }
    value.powd(Decimal::ONE / Decimal::from(n))
}

/// Constant per-period return that carries `from` to `to` in `periods` steps:
/// `(to / from)^(1 / periods) - 1`.
///
/// `from` must be positive and `to` non-negative.
pub fn implied_periodic_return(from: Money, to: Money, periods: u32) -> Rate {
    nth_root(saturating_div(to, from), periods) - Decimal::ONE
}

/// Multiplicative holding-cost discount `(1 - rate)^days`.
pub fn cost_decay(daily_rate: Rate, days: u32) -> Decimal {
    compound(Decimal::ONE - daily_rate, days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_compound_zero_periods_is_identity() {
        assert_eq!(compound(dec!(1.05), 0), Decimal::ONE);
    }

    #[test]
    fn test_compound_exact() {
        assert_eq!(compound(dec!(1.1), 3), dec!(1.331));
    }

    #[test]
    fn test_nth_root_identities() {
        assert_eq!(nth_root(Decimal::ONE, 20), Decimal::ONE);
        assert_eq!(nth_root(Decimal::ZERO, 20), Decimal::ZERO);
        assert_eq!(nth_root(dec!(1.2), 1), dec!(1.2));
    }

    #[test]
    fn test_nth_root_inverts_compound() {
        let root = nth_root(dec!(1.21), 2);
        assert!(approx_eq(root, dec!(1.1), dec!(0.000001)), "got {root}");
        let root = nth_root(dec!(0.8), 20);
        assert!(approx_eq(compound(root, 20), dec!(0.8), dec!(0.000001)));
    }

    #[test]
    fn test_implied_return_flat_is_zero() {
        assert_eq!(implied_periodic_return(dec!(100), dec!(100), 20), Decimal::ZERO);
    }

    #[test]
    fn test_implied_return_single_period() {
        assert_eq!(implied_periodic_return(dec!(100), dec!(120), 1), dec!(0.2));
    }

    #[test]
    fn test_compound_saturates_with_sign() {
        assert_eq!(compound(dec!(6), 40), Decimal::MAX);
        assert_eq!(compound(dec!(-4), 50), Decimal::MAX);
        assert_eq!(compound(dec!(-4), 51), Decimal::MIN);
        assert!(is_saturated(compound(dec!(11), 30)));
        assert!(!is_saturated(compound(dec!(0.5), 3650)));
    }

    #[test]
    fn test_saturating_div_clamps() {
        assert_eq!(saturating_div(dec!(10), dec!(4)), dec!(2.5));
        assert_eq!(saturating_div(Decimal::MAX, dec!(0.001)), Decimal::MAX);
        assert_eq!(saturating_div(Decimal::MIN, dec!(0.001)), Decimal::MIN);
    }

    #[test]
    fn test_implied_return_from_price_zero() {
        assert_eq!(implied_periodic_return(dec!(100), Decimal::ZERO, 50), dec!(-1));
    }

    #[test]
    fn test_cost_decay() {
        assert_eq!(cost_decay(dec!(0.01), 0), Decimal::ONE);
        assert_eq!(cost_decay(dec!(0.01), 2), dec!(0.9801));
        assert_eq!(cost_decay(Decimal::ZERO, 30), Decimal::ONE);
    }
}
