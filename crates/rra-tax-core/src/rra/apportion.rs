use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::RraError;
use crate::types::{Money, Months, Rate};
use crate::RraResult;

/// Each line's share of the total corrected award value. All shares are zero
/// when the total is zero.
pub fn award_shares(deflated_values: &[Money]) -> Vec<Rate> {
    let total: Money = deflated_values.iter().sum();
    deflated_values
        .iter()
        .map(|value| {
            if total.is_zero() {
                Decimal::ZERO
            } else {
                value / total
            }
        })
        .collect()
}

/// Portion of the aggregate withholding attributed to one line, expressed on
/// the line's own (uncorrected) monetary basis: `total × share / coefficient`.
pub fn apportion_withholding(
    total_withholding: Money,
    share: Rate,
    coefficient: Rate,
) -> RraResult<Money> {
    if coefficient.is_zero() {
        return Err(RraError::DivisionByZero {
            context: "withholding apportionment (correction coefficient is zero)".into(),
        });
    }
    Ok(total_withholding * share / coefficient)
}

/// Months attributed to one line, rounded with [`round_months`].
pub fn apportion_months(total_months: Months, share: Rate) -> Months {
    round_months(total_months * share)
}

/// Rounds a month count to one decimal place by digit inspection (Art. 45 rule).
///
/// The digits are read from the value rounded to three places (2.2549 is read
/// as 2.255). With `d2`/`d3` the second and third decimal digits: `d2 < 5`
/// truncates, `d2 > 5` rounds up, `d2 == 5` rounds up only when `d3 >= 5`.
/// So 2.25 → 2.2 where half-up rounding would give 2.3. Carries propagate
/// (9.96 → 10.0); negative values are rounded by magnitude.
pub fn round_months(raw: Months) -> Months {
    let magnitude = raw
        .abs()
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    let tenths = magnitude.round_dp_with_strategy(1, RoundingStrategy::ToZero);

    let hundredths = (magnitude - tenths) * dec!(100);
    let second = hundredths.trunc();
    let third = ((hundredths - second) * dec!(10)).trunc();

    let round_up = second > dec!(5) || (second == dec!(5) && third >= dec!(5));
    let rounded = if round_up { tenths + dec!(0.1) } else { tenths };

    if raw.is_sign_negative() {
        (-rounded).normalize()
    } else {
        rounded.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_digit_below_five_truncates() {
        assert_eq!(round_months(dec!(2.249)), dec!(2.2));
        assert_eq!(round_months(dec!(26.8497)), dec!(26.8));
        assert_eq!(round_months(dec!(2.8267)), dec!(2.8));
    }

    #[test]
    fn test_second_digit_above_five_rounds_up() {
        assert_eq!(round_months(dec!(2.26)), dec!(2.3));
        assert_eq!(round_months(dec!(19.2734)), dec!(19.3));
    }

    #[test]
    fn test_second_digit_five_checks_third() {
        assert_eq!(round_months(dec!(2.255)), dec!(2.3));
        assert_eq!(round_months(dec!(2.259)), dec!(2.3));
        assert_eq!(round_months(dec!(2.2544)), dec!(2.2));
    }

    #[test]
    fn test_digits_read_after_rounding_to_three_places() {
        assert_eq!(round_months(dec!(2.2549)), dec!(2.3));
        assert_eq!(round_months(dec!(7.1547)), dec!(7.2));
        assert_eq!(round_months(dec!(26.8497)), dec!(26.8));
        assert_eq!(round_months(dec!(2.9996)), dec!(3));
        assert_eq!(round_months(dec!(-2.2549)), dec!(-2.3));
    }

    #[test]
    fn test_exact_five_differs_from_half_up() {
        // Half-up would give 2.3 and 6.8
        assert_eq!(round_months(dec!(2.25)), dec!(2.2));
        assert_eq!(round_months(dec!(6.75)), dec!(6.7));
        assert_ne!(
            round_months(dec!(2.25)),
            dec!(2.25).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        );
    }

    #[test]
    fn test_carry_into_integer_part() {
        assert_eq!(round_months(dec!(9.96)), dec!(10));
        assert_eq!(round_months(dec!(0.99)), dec!(1));
    }

    #[test]
    fn test_whole_and_one_decimal_values_unchanged() {
        assert_eq!(round_months(dec!(58)), dec!(58));
        assert_eq!(round_months(dec!(2.3)), dec!(2.3));
        assert_eq!(round_months(dec!(0)), dec!(0));
    }

    #[test]
    fn test_negative_rounds_by_magnitude() {
        assert_eq!(round_months(dec!(-2.26)), dec!(-2.3));
        assert_eq!(round_months(dec!(-2.25)), dec!(-2.2));
    }

    #[test]
    fn test_shares_sum_to_one() {
        let shares = award_shares(&[dec!(100), dec!(300)]);
        assert_eq!(shares, vec![dec!(0.25), dec!(0.75)]);
    }

    #[test]
    fn test_shares_zero_total() {
        let shares = award_shares(&[dec!(0), dec!(0)]);
        assert_eq!(shares, vec![dec!(0), dec!(0)]);
    }

    #[test]
    fn test_withholding_back_on_original_basis() {
        // 10,000 × 0.5 / 1.25
        let withheld = apportion_withholding(dec!(10000), dec!(0.5), dec!(1.25)).unwrap();
        assert_eq!(withheld, dec!(4000));
    }

    #[test]
    fn test_withholding_zero_coefficient() {
        assert!(apportion_withholding(dec!(10000), dec!(0.5), dec!(0)).is_err());
    }

    #[test]
    fn test_months_apportioned_then_rounded() {
        assert_eq!(apportion_months(dec!(9), dec!(0.25)), dec!(2.2));
        assert_eq!(apportion_months(dec!(9), dec!(0.75)), dec!(6.7));
    }
}
