use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RraError;
use crate::types::{Money, Rate};
use crate::RraResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One progressive band of a monthly IRPF table.
///
/// `min` is informational (published lower bound); lookup uses the inclusive
/// upper bound `max`, so a base exactly at `max` stays in this band and a base
/// inside the one-cent gap before the next band's `min` falls into the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Money>,
    pub rate: Rate,
    pub deduction: Money,
}

impl Band {
    fn new(min: Money, max: Option<Money>, rate: Rate, deduction: Money) -> Self {
        Self {
            min,
            max,
            rate,
            deduction,
        }
    }

    fn admits(&self, base: Money) -> bool {
        self.max.map_or(true, |max| base <= max)
    }
}

/// A progressive table in force up to (and including) `valid_through`.
/// The latest table of a schedule has no `valid_through`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketTable {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_through: Option<NaiveDate>,
    pub bands: Vec<Band>,
}

impl BracketTable {
    /// Lowest band whose upper bound admits `base`.
    pub fn band_for(&self, base: Money) -> Option<&Band> {
        self.bands.iter().find(|band| band.admits(base))
    }

    /// `max(0, rate × base − deduction)` for the band containing `base`.
    pub fn monthly_tax(&self, base: Money) -> Money {
        match self.band_for(base) {
            Some(band) => (band.rate * base - band.deduction).max(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    fn validate(&self, is_last: bool) -> RraResult<()> {
        let invalid = |reason: String| RraError::InvalidTable {
            table: format!("brackets[{}]", self.label),
            reason,
        };

        if is_last && self.valid_through.is_some() {
            return Err(invalid("the latest table must not have a cutover date".into()));
        }
        if !is_last && self.valid_through.is_none() {
            return Err(invalid("only the latest table may be open-ended".into()));
        }
        if self.bands.is_empty() {
            return Err(invalid("table has no bands".into()));
        }

        let last = self.bands.len() - 1;
        let mut previous_max: Option<Money> = None;
        for (i, band) in self.bands.iter().enumerate() {
            match (band.max, i == last) {
                (Some(_), true) => {
                    return Err(invalid("the last band must be unbounded".into()));
                }
                (None, false) => {
                    return Err(invalid(format!("band {} is unbounded but not last", i + 1)));
                }
                (Some(max), false) => {
                    if let Some(prev) = previous_max {
                        if max <= prev {
                            return Err(invalid(format!(
                                "band {} upper bound {} does not exceed {}",
                                i + 1,
                                max,
                                prev
                            )));
                        }
                    }
                    previous_max = Some(max);
                }
                (None, true) => {}
            }
        }
        Ok(())
    }
}

/// Chronologically ordered progressive tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BracketSchedule {
    pub tables: Vec<BracketTable>,
}

impl Default for BracketSchedule {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BracketSchedule {
    /// The five monthly IRPF tables in force from 04/2015 onwards.
    pub fn builtin() -> Self {
        Self {
            tables: vec![
                BracketTable {
                    label: "2015-04 to 2023-04".into(),
                    valid_through: cutover(2023, 4, 30),
                    bands: standard_bands(
                        dec!(1903.98),
                        [dec!(142.80), dec!(354.80), dec!(636.13), dec!(869.36)],
                    ),
                },
                BracketTable {
                    label: "2023-05 to 2024-01".into(),
                    valid_through: cutover(2024, 1, 31),
                    bands: standard_bands(
                        dec!(2112.00),
                        [dec!(158.40), dec!(370.40), dec!(651.73), dec!(884.96)],
                    ),
                },
                BracketTable {
                    label: "2024-02 to 2025-04".into(),
                    valid_through: cutover(2025, 4, 30),
                    bands: standard_bands(
                        dec!(2259.20),
                        [dec!(169.44), dec!(381.44), dec!(662.77), dec!(896.00)],
                    ),
                },
                BracketTable {
                    label: "2025-05 to 2025-12".into(),
                    valid_through: cutover(2025, 12, 31),
                    bands: standard_bands(
                        dec!(2428.80),
                        [dec!(182.16), dec!(394.16), dec!(675.49), dec!(908.73)],
                    ),
                },
                BracketTable {
                    label: "2026-01 onwards".into(),
                    valid_through: None,
                    bands: standard_bands(
                        dec!(2428.80),
                        [dec!(182.16), dec!(394.16), dec!(675.49), dec!(908.73)],
                    ),
                },
            ],
        }
    }

    /// Table in force for `reference`: the end of its month is compared
    /// against each cutover in order, falling back to the latest table.
    pub fn select(&self, reference: NaiveDate) -> Option<&BracketTable> {
        let month_end = end_of_month(reference);
        self.tables
            .iter()
            .find(|table| table.valid_through.map_or(false, |limit| month_end <= limit))
            .or_else(|| self.latest())
    }

    pub fn latest(&self) -> Option<&BracketTable> {
        self.tables.last()
    }

    pub(crate) fn validate(&self) -> RraResult<()> {
        if self.tables.is_empty() {
            return Err(RraError::InvalidTable {
                table: "brackets".into(),
                reason: "schedule has no tables".into(),
            });
        }

        let last = self.tables.len() - 1;
        let mut previous: Option<NaiveDate> = None;
        for (i, table) in self.tables.iter().enumerate() {
            table.validate(i == last)?;
            if let Some(limit) = table.valid_through {
                if previous.map_or(false, |prev| limit <= prev) {
                    return Err(RraError::InvalidTable {
                        table: format!("brackets[{}]", table.label),
                        reason: format!("cutover {limit} is not after the previous table's"),
                    });
                }
                previous = Some(limit);
            }
        }
        Ok(())
    }
}

/// Last calendar day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

fn cutover(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

// Every table since 2015 shares the 7.5/15/22.5/27.5% ladder and the upper
// limits of bands 2-4; only the exemption ceiling and deductions moved.
fn standard_bands(exempt_ceiling: Money, deductions: [Money; 4]) -> Vec<Band> {
    vec![
        Band::new(Decimal::ZERO, Some(exempt_ceiling), Decimal::ZERO, Decimal::ZERO),
        Band::new(
            exempt_ceiling + dec!(0.01),
            Some(dec!(2826.65)),
            dec!(0.075),
            deductions[0],
        ),
        Band::new(dec!(2826.66), Some(dec!(3751.05)), dec!(0.15), deductions[1]),
        Band::new(dec!(3751.06), Some(dec!(4664.68)), dec!(0.225), deductions[2]),
        Band::new(dec!(4664.69), None, dec!(0.275), deductions[3]),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_of_month() {
        assert_eq!(end_of_month(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(end_of_month(date(2023, 2, 1)), date(2023, 2, 28));
        assert_eq!(end_of_month(date(2025, 12, 3)), date(2025, 12, 31));
        assert_eq!(end_of_month(date(2023, 4, 30)), date(2023, 4, 30));
    }

    #[test]
    fn test_select_by_certificate_month() {
        let schedule = BracketSchedule::builtin();
        let label = |d: NaiveDate| schedule.select(d).unwrap().label.clone();

        assert_eq!(label(date(2020, 12, 24)), "2015-04 to 2023-04");
        assert_eq!(label(date(2023, 4, 1)), "2015-04 to 2023-04");
        assert_eq!(label(date(2023, 5, 1)), "2023-05 to 2024-01");
        assert_eq!(label(date(2024, 1, 31)), "2023-05 to 2024-01");
        assert_eq!(label(date(2024, 11, 6)), "2024-02 to 2025-04");
        assert_eq!(label(date(2025, 5, 2)), "2025-05 to 2025-12");
        assert_eq!(label(date(2026, 3, 1)), "2026-01 onwards");
    }

    #[test]
    fn test_band_upper_bound_is_inclusive() {
        let schedule = BracketSchedule::builtin();
        let table = &schedule.tables[0];

        assert_eq!(table.band_for(dec!(1903.98)).unwrap().rate, dec!(0));
        // Inside the published one-cent gap: next band
        assert_eq!(table.band_for(dec!(1903.985)).unwrap().rate, dec!(0.075));
        assert_eq!(table.band_for(dec!(2826.65)).unwrap().rate, dec!(0.075));
        assert_eq!(table.band_for(dec!(4664.68)).unwrap().rate, dec!(0.225));
        assert_eq!(table.band_for(dec!(4664.69)).unwrap().rate, dec!(0.275));
        assert_eq!(table.band_for(dec!(1_000_000)).unwrap().rate, dec!(0.275));
    }

    #[test]
    fn test_monthly_tax() {
        let schedule = BracketSchedule::builtin();
        let table = &schedule.tables[1];
        // 2916.67 falls in the 15% band: 0.15 × 2916.67 − 370.40
        assert_eq!(table.monthly_tax(dec!(2916.67)), dec!(67.1005));
        assert_eq!(table.monthly_tax(dec!(1500)), dec!(0));
    }

    #[test]
    fn test_monthly_tax_floors_at_zero() {
        let table = BracketTable {
            label: "steep deduction".into(),
            valid_through: None,
            bands: vec![Band::new(dec!(0), None, dec!(0.1), dec!(500))],
        };
        assert_eq!(table.monthly_tax(dec!(1000)), dec!(0));
    }

    #[test]
    fn test_builtin_schedule_validates() {
        assert!(BracketSchedule::builtin().validate().is_ok());
    }

    #[test]
    fn test_rejects_unordered_cutovers() {
        let mut schedule = BracketSchedule::builtin();
        schedule.tables.swap(0, 1);
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_rejects_bounded_last_band() {
        let mut schedule = BracketSchedule::builtin();
        schedule.tables[4].bands[4].max = Some(dec!(10000));
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_schedule() {
        let schedule = BracketSchedule { tables: vec![] };
        assert!(schedule.validate().is_err());
        assert!(schedule.select(date(2024, 1, 1)).is_none());
    }
}
