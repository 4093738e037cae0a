use rust_decimal::Decimal;

use crate::error::RraError;
use crate::types::{Money, Rate};
use crate::RraResult;

/// Taxable fraction of the homologated gross amount.
///
/// The result is not clamped: a taxable amount above the gross (or a negative
/// one) produces a proportion outside [0, 1] and is used as is.
pub fn taxable_proportion(gross_amount: Money, taxable_amount: Money) -> RraResult<Rate> {
    if gross_amount <= Decimal::ZERO {
        return Err(RraError::InvalidInput {
            field: "gross_amount".into(),
            reason: "Homologated gross amount must be greater than zero".into(),
        });
    }
    Ok(taxable_amount / gross_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_half_taxable() {
        assert_eq!(taxable_proportion(dec!(100000), dec!(50000)).unwrap(), dec!(0.5));
    }

    #[test]
    fn test_zero_gross_rejected() {
        match taxable_proportion(dec!(0), dec!(50000)) {
            Err(RraError::InvalidInput { field, .. }) => assert_eq!(field, "gross_amount"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_gross_rejected() {
        assert!(taxable_proportion(dec!(-10), dec!(5)).is_err());
    }

    #[test]
    fn test_not_clamped() {
        assert_eq!(taxable_proportion(dec!(100), dec!(150)).unwrap(), dec!(1.5));
        assert_eq!(taxable_proportion(dec!(100), dec!(-20)).unwrap(), dec!(-0.2));
    }
}
