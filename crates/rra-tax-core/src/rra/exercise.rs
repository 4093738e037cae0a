use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::rra::bracket_selector::exercise_tax;
use crate::tables::selic::updated_restitution;
use crate::tables::{BracketTable, SelicTable};
use crate::types::{Money, Months, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// Withheld tax exceeds (or equals) tax due
    Restitution,
    /// Additional tax owed
    Due,
}

impl Qualifier {
    pub fn of(net: Money) -> Self {
        if net >= Decimal::ZERO {
            Qualifier::Restitution
        } else {
            Qualifier::Due
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Qualifier::Restitution => "Tax to be refunded",
            Qualifier::Due => "Tax to be paid",
        }
    }
}

/// Result for one filing exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalExercise {
    pub exercise: i32,
    pub taxable_income: Money,
    pub withheld_total: Money,
    pub allocated_months: Months,
    pub tax_due: Money,
    /// withheld_total − tax_due
    pub net: Money,
    pub qualifier: Qualifier,
    pub selic_rate: Rate,
    /// Restitution updated by SELIC; zero when tax is due
    pub updated_net: Money,
}

/// What a single award line feeds into exercise grouping. Award amounts,
/// withholding and months land on `award_exercise`; the fee deduction lands
/// on `fee_exercise`, which may be a different year.
#[derive(Debug, Clone, PartialEq)]
pub struct LineContribution {
    pub award_exercise: i32,
    pub fee_exercise: Option<i32>,
    pub award_taxable: Money,
    pub fee_taxable: Money,
    pub withheld: Money,
    pub months: Months,
}

#[derive(Debug, Default)]
struct ExerciseTotals {
    award_taxable: Money,
    fee_taxable: Money,
    withheld: Money,
    months: Months,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Groups line contributions into ascending fiscal exercises and evaluates
/// each one against `table`.
///
/// An exercise whose award-taxable and fee-taxable sums are both zero is left
/// out. Taxable income is floored at zero; net is not.
pub fn aggregate_exercises(
    contributions: &[LineContribution],
    table: &BracketTable,
    selic: &SelicTable,
    warnings: &mut Vec<String>,
) -> Vec<FiscalExercise> {
    let mut by_exercise: BTreeMap<i32, ExerciseTotals> = BTreeMap::new();

    for line in contributions {
        let totals = by_exercise.entry(line.award_exercise).or_default();
        totals.award_taxable += line.award_taxable;
        totals.withheld += line.withheld;
        totals.months += line.months;

        if let Some(fee_exercise) = line.fee_exercise {
            by_exercise.entry(fee_exercise).or_default().fee_taxable += line.fee_taxable;
        }
    }

    by_exercise
        .into_iter()
        .filter(|(_, t)| !(t.award_taxable.is_zero() && t.fee_taxable.is_zero()))
        .map(|(exercise, t)| {
            let taxable_income = (t.award_taxable - t.fee_taxable).max(Decimal::ZERO);
            let tax_due = exercise_tax(table, taxable_income, t.months);
            let net = t.withheld - tax_due;

            let selic_rate = match selic.rate_for(exercise) {
                Some(rate) => rate,
                None => {
                    warn!(exercise, "SELIC rate not found, using 0");
                    warnings.push(format!(
                        "SELIC rate not found for exercise {exercise}; restitution not updated"
                    ));
                    Decimal::ZERO
                }
            };

            FiscalExercise {
                exercise,
                taxable_income,
                withheld_total: t.withheld,
                allocated_months: t.months,
                tax_due,
                net,
                qualifier: Qualifier::of(net),
                selic_rate,
                updated_net: updated_restitution(net, selic_rate),
            }
        })
        .collect()
}

/// Plain sum of exercise nets (never SELIC-corrected).
pub fn aggregate_net(exercises: &[FiscalExercise]) -> Money {
    exercises.iter().map(|e| e.net).sum()
}

pub fn aggregate_updated(exercises: &[FiscalExercise]) -> Money {
    exercises.iter().map(|e| e.updated_net).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::BracketSchedule;
    use rust_decimal_macros::dec;

    fn line(
        award_exercise: i32,
        fee_exercise: Option<i32>,
        award_taxable: Money,
        fee_taxable: Money,
        withheld: Money,
        months: Months,
    ) -> LineContribution {
        LineContribution {
            award_exercise,
            fee_exercise,
            award_taxable,
            fee_taxable,
            withheld,
            months,
        }
    }

    fn run(lines: &[LineContribution]) -> (Vec<FiscalExercise>, Vec<String>) {
        let schedule = BracketSchedule::builtin();
        let selic = SelicTable::builtin();
        let mut warnings = Vec::new();
        let exercises = aggregate_exercises(lines, &schedule.tables[2], &selic, &mut warnings);
        (exercises, warnings)
    }

    #[test]
    fn test_qualifier_sign() {
        assert_eq!(Qualifier::of(dec!(0)), Qualifier::Restitution);
        assert_eq!(Qualifier::of(dec!(0.01)), Qualifier::Restitution);
        assert_eq!(Qualifier::of(dec!(-0.01)), Qualifier::Due);
    }

    #[test]
    fn test_groups_by_award_exercise_in_order() {
        let (exercises, _) = run(&[
            line(2025, None, dec!(1000), dec!(0), dec!(100), dec!(2)),
            line(2022, None, dec!(500), dec!(0), dec!(50), dec!(1)),
            line(2025, None, dec!(3000), dec!(0), dec!(300), dec!(3)),
        ]);
        let years: Vec<i32> = exercises.iter().map(|e| e.exercise).collect();
        assert_eq!(years, vec![2022, 2025]);
        assert_eq!(exercises[1].taxable_income, dec!(4000));
        assert_eq!(exercises[1].withheld_total, dec!(400));
        assert_eq!(exercises[1].allocated_months, dec!(5));
    }

    #[test]
    fn test_fee_deducted_in_its_own_exercise() {
        // Fee paid a year later reduces the later exercise, not the award's
        let (exercises, _) = run(&[
            line(2022, Some(2023), dec!(10000), dec!(4000), dec!(100), dec!(4)),
            line(2023, None, dec!(6000), dec!(0), dec!(60), dec!(2)),
        ]);
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].taxable_income, dec!(10000));
        assert_eq!(exercises[1].taxable_income, dec!(2000));
    }

    #[test]
    fn test_taxable_floored_but_net_kept() {
        let (exercises, _) = run(&[line(2022, Some(2022), dec!(1000), dec!(5000), dec!(300), dec!(2))]);
        assert_eq!(exercises[0].taxable_income, dec!(0));
        assert_eq!(exercises[0].tax_due, dec!(0));
        assert_eq!(exercises[0].net, dec!(300));
        assert_eq!(exercises[0].qualifier, Qualifier::Restitution);
    }

    #[test]
    fn test_fee_only_exercise_is_kept() {
        let (exercises, _) = run(&[line(2022, Some(2024), dec!(1000), dec!(200), dec!(0), dec!(1))]);
        let years: Vec<i32> = exercises.iter().map(|e| e.exercise).collect();
        assert_eq!(years, vec![2022, 2024]);
        let fee_only = &exercises[1];
        assert_eq!(fee_only.taxable_income, dec!(0));
        assert_eq!(fee_only.withheld_total, dec!(0));
        assert_eq!(fee_only.net, dec!(0));
    }

    #[test]
    fn test_zero_exercise_dropped() {
        let (exercises, _) = run(&[
            line(2022, None, dec!(0), dec!(0), dec!(0), dec!(0)),
            line(2023, None, dec!(100), dec!(0), dec!(0), dec!(1)),
        ]);
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].exercise, 2023);
    }

    #[test]
    fn test_due_exercise_not_selic_updated() {
        // 120,000 over 12 months at 27.5%: well above the 1,000 withheld
        let (exercises, _) = run(&[line(2022, None, dec!(120000), dec!(0), dec!(1000), dec!(12))]);
        let e = &exercises[0];
        assert!(e.net < dec!(0));
        assert_eq!(e.qualifier, Qualifier::Due);
        assert_eq!(e.selic_rate, dec!(0.4339));
        assert_eq!(e.updated_net, dec!(0));
    }

    #[test]
    fn test_restitution_selic_updated() {
        let (exercises, _) = run(&[line(2024, None, dec!(1000), dec!(0), dec!(500), dec!(1))]);
        let e = &exercises[0];
        assert_eq!(e.net, dec!(500));
        assert_eq!(e.updated_net, dec!(560));
    }

    #[test]
    fn test_missing_selic_warns() {
        let (exercises, warnings) = run(&[line(2030, None, dec!(1000), dec!(0), dec!(500), dec!(1))]);
        assert_eq!(exercises[0].selic_rate, dec!(0));
        assert_eq!(exercises[0].updated_net, dec!(500));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_aggregate_is_plain_sum() {
        let (exercises, _) = run(&[
            line(2022, None, dec!(120000), dec!(0), dec!(1000), dec!(12)),
            line(2024, None, dec!(1000), dec!(0), dec!(500), dec!(1)),
        ]);
        assert_eq!(aggregate_net(&exercises), exercises[0].net + exercises[1].net);
        assert_eq!(aggregate_updated(&exercises), dec!(560));
    }
}
