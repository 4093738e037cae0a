use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;

use crate::rra::fiscal_year::calendar_years;
use crate::tables::MonetaryIndexTable;
use crate::types::Rate;

/// Whether monetary correction applies to a lawsuit.
///
/// Awards that all fall in one calendar year are never corrected, whatever the
/// caller asked for. Otherwise the caller's hint decides (default: correct).
pub fn deflation_enabled<I>(award_dates: I, hint: Option<bool>) -> bool
where
    I: IntoIterator<Item = NaiveDate>,
{
    calendar_years(award_dates).len() > 1 && hint.unwrap_or(true)
}

/// Correction coefficient lookup bound to one calculation.
#[derive(Debug, Clone, Copy)]
pub struct Deflator<'a> {
    index: &'a MonetaryIndexTable,
    enabled: bool,
}

impl<'a> Deflator<'a> {
    pub fn new(index: &'a MonetaryIndexTable, enabled: bool) -> Self {
        Self { index, enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Coefficient for the month of `date`; exactly 1 when correction is off.
    /// Months outside the table degrade to 1 and record a warning.
    pub fn coefficient(&self, date: NaiveDate, warnings: &mut Vec<String>) -> Rate {
        if !self.enabled {
            return Decimal::ONE;
        }
        match self.index.coefficient_for(date) {
            Some(coefficient) => coefficient,
            None => {
                let month = MonetaryIndexTable::key_for(date);
                warn!(%month, "IPCA-E coefficient not found, using 1.0");
                warnings.push(format!(
                    "IPCA-E coefficient not found for {month}; value left uncorrected (1.0)"
                ));
                Decimal::ONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_year_overrides_hint() {
        let dates = [date(2020, 1, 15), date(2020, 12, 20)];
        assert!(!deflation_enabled(dates, Some(true)));
        assert!(!deflation_enabled(dates, None));
    }

    #[test]
    fn test_multi_year_follows_hint() {
        let dates = [date(2020, 1, 15), date(2021, 12, 20)];
        assert!(deflation_enabled(dates, None));
        assert!(deflation_enabled(dates, Some(true)));
        assert!(!deflation_enabled(dates, Some(false)));
    }

    #[test]
    fn test_no_dates_means_no_deflation() {
        assert!(!deflation_enabled(Vec::<NaiveDate>::new(), Some(true)));
    }

    #[test]
    fn test_disabled_is_exactly_one() {
        let index = MonetaryIndexTable::builtin();
        let deflator = Deflator::new(&index, false);
        let mut warnings = Vec::new();
        assert_eq!(deflator.coefficient(date(2021, 6, 15), &mut warnings), Decimal::ONE);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_enabled_looks_up_month() {
        let index = MonetaryIndexTable::builtin();
        let deflator = Deflator::new(&index, true);
        let mut warnings = Vec::new();
        assert_eq!(
            deflator.coefficient(date(2021, 6, 15), &mut warnings),
            dec!(1.2863280337)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_month_warns_and_is_neutral() {
        let index = MonetaryIndexTable::builtin();
        let deflator = Deflator::new(&index, true);
        let mut warnings = Vec::new();
        assert_eq!(deflator.coefficient(date(2010, 3, 1), &mut warnings), Decimal::ONE);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("2010-03"));
    }
}
