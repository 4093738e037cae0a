use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::RraError;
use crate::rra::apportion::{apportion_months, apportion_withholding, award_shares, round_months};
use crate::rra::bracket_selector::select_table;
use crate::rra::deflation::{deflation_enabled, Deflator};
use crate::rra::exercise::{
    aggregate_exercises, aggregate_net, aggregate_updated, FiscalExercise, LineContribution,
    Qualifier,
};
use crate::rra::fiscal_year::{calendar_years, exercise_of, fee_exercise_of};
use crate::rra::proportion::taxable_proportion;
use crate::tables::TaxTables;
use crate::types::*;
use crate::RraResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One court release ("alvará") with the lawyer fee paid out of it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardLine {
    pub award_value: Money,
    pub award_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_paid_year: Option<i32>,
}

/// Proof of tax withheld at source (DARF).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithholdingCertificate {
    pub amount: Money,
    pub certificate_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RraInput {
    /// Homologated gross amount of the lawsuit
    pub gross_amount: Money,
    /// Homologated taxable amount of the lawsuit
    pub taxable_amount: Money,
    /// Months the award refers to
    pub total_months: Months,
    #[serde(default)]
    pub lines: Vec<AwardLine>,
    #[serde(default)]
    pub certificates: Vec<WithholdingCertificate>,
    /// Advisory: awards within a single calendar year are never corrected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_deflation_hint: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationPath {
    /// Every award in one calendar year: amounts summed, one exercise
    SingleYear,
    /// Awards spread over several years: per-line apportionment
    MultiYear,
}

/// Per-line working figures, in input order. Fields that the single-year
/// path does not compute per line are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBreakdown {
    pub award_exercise: i32,
    pub fee_exercise: Option<i32>,
    pub coefficient: Rate,
    pub deflated_value: Money,
    pub share: Rate,
    pub withheld: Option<Money>,
    pub raw_months: Option<Months>,
    pub allocated_months: Option<Months>,
    pub award_taxable: Option<Money>,
    pub fee_taxable: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RraOutput {
    pub proportion: Rate,
    pub total_deflated_awards: Money,
    pub total_withholding_original: Money,
    pub calculation_path: CalculationPath,
    pub deflation_applied: bool,
    /// Label of the progressive table applied; absent when nothing was evaluated
    pub bracket_table: Option<String>,
    pub lines: Vec<LineBreakdown>,
    pub exercises: Vec<FiscalExercise>,
    pub aggregate_net: Money,
    pub aggregate_qualifier: Qualifier,
    /// Sum of SELIC-updated restitutions (informational)
    pub aggregate_updated: Money,
}

impl RraOutput {
    fn empty() -> Self {
        RraOutput {
            proportion: Decimal::ZERO,
            total_deflated_awards: Decimal::ZERO,
            total_withholding_original: Decimal::ZERO,
            calculation_path: CalculationPath::SingleYear,
            deflation_applied: false,
            bracket_table: None,
            lines: Vec::new(),
            exercises: Vec::new(),
            aggregate_net: Decimal::ZERO,
            aggregate_qualifier: Qualifier::Restitution,
            aggregate_updated: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// RRA restitution calculator bound to a set of static tables.
///
/// Holds no mutable state; one instance may serve any number of concurrent
/// calculations.
#[derive(Debug, Clone, Default)]
pub struct RraCalculator {
    tables: TaxTables,
}

impl RraCalculator {
    /// Calculator over caller-supplied tables, validated up front.
    pub fn new(tables: TaxTables) -> RraResult<Self> {
        tables.validate()?;
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &TaxTables {
        &self.tables
    }

    /// Calculate per-exercise restitution, choosing the single-year path when
    /// every award falls in the same calendar year.
    pub fn calculate(&self, input: &RraInput) -> RraResult<ComputationOutput<RraOutput>> {
        self.run(input, None)
    }

    /// Calculate with an explicit path. The multi-year path accepts any input;
    /// the single-year path rejects awards spread over several years.
    pub fn calculate_via(
        &self,
        input: &RraInput,
        path: CalculationPath,
    ) -> RraResult<ComputationOutput<RraOutput>> {
        self.run(input, Some(path))
    }

    fn run(
        &self,
        input: &RraInput,
        forced_path: Option<CalculationPath>,
    ) -> RraResult<ComputationOutput<RraOutput>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let proportion = taxable_proportion(input.gross_amount, input.taxable_amount)?;

        if input.lines.is_empty() {
            warnings.push("No award lines supplied; nothing to calculate".into());
            return Ok(envelope(input, warnings, start, RraOutput::empty()));
        }

        if proportion < Decimal::ZERO || proportion > Decimal::ONE {
            warnings.push(format!(
                "Taxable proportion {proportion} is outside [0, 1]; used as computed"
            ));
        }
        if input.total_months <= Decimal::ZERO {
            warnings.push("Total months is not positive; no tax will be due".into());
        }

        let award_dates = input.lines.iter().map(|l| l.award_date);
        let single_year = calendar_years(award_dates.clone()).len() == 1;
        let path = match forced_path {
            Some(CalculationPath::SingleYear) if !single_year => {
                return Err(RraError::InvalidInput {
                    field: "lines".into(),
                    reason: "Single-year path requires every award in the same calendar year"
                        .into(),
                });
            }
            Some(path) => path,
            None if single_year => CalculationPath::SingleYear,
            None => CalculationPath::MultiYear,
        };

        let deflator = Deflator::new(
            &self.tables.monetary_index,
            deflation_enabled(award_dates, input.use_deflation_hint),
        );
        debug!(?path, deflation = deflator.enabled(), "calculation path selected");

        let table = select_table(&self.tables.brackets, &input.certificates, &mut warnings)?;
        let total_withholding: Money = input.certificates.iter().map(|c| c.amount).sum();

        let coefficients: Vec<Rate> = input
            .lines
            .iter()
            .map(|l| deflator.coefficient(l.award_date, &mut warnings))
            .collect();
        let deflated: Vec<Money> = input
            .lines
            .iter()
            .zip(&coefficients)
            .map(|(l, coefficient)| l.award_value * coefficient)
            .collect();
        let total_deflated: Money = deflated.iter().sum();
        let shares = award_shares(&deflated);

        let mut breakdown: Vec<LineBreakdown> = Vec::with_capacity(input.lines.len());
        let mut contributions: Vec<LineContribution> = Vec::new();

        match path {
            CalculationPath::MultiYear => {
                for (i, line) in input.lines.iter().enumerate() {
                    let withheld =
                        apportion_withholding(total_withholding, shares[i], coefficients[i])?;
                    let raw_months = input.total_months * shares[i];
                    let months = apportion_months(input.total_months, shares[i]);
                    let award_taxable = (line.award_value + withheld) * proportion;
                    let fee_taxable = line_fee_taxable(line, proportion);
                    let award_exercise = exercise_of(line.award_date);
                    let fee_exercise = fee_exercise_of(line.fee_paid_year);

                    contributions.push(LineContribution {
                        award_exercise,
                        fee_exercise,
                        award_taxable,
                        fee_taxable,
                        withheld,
                        months,
                    });
                    breakdown.push(LineBreakdown {
                        award_exercise,
                        fee_exercise,
                        coefficient: coefficients[i],
                        deflated_value: deflated[i],
                        share: shares[i],
                        withheld: Some(withheld),
                        raw_months: Some(raw_months),
                        allocated_months: Some(months),
                        award_taxable: Some(award_taxable),
                        fee_taxable,
                    });
                }
            }
            CalculationPath::SingleYear => {
                // Withholding, awards and fees are taken as totals; the whole
                // month count stays with the single exercise. Fees paid in
                // another year fall in an exercise with no award income and
                // do not reduce this one.
                let exercise = exercise_of(input.lines[0].award_date);
                let mut award_total = Decimal::ZERO;
                let mut fee_total = Decimal::ZERO;

                for (i, line) in input.lines.iter().enumerate() {
                    let fee_exercise = fee_exercise_of(line.fee_paid_year);
                    let fee_taxable = line_fee_taxable(line, proportion);
                    award_total += line.award_value;
                    if fee_exercise == Some(exercise) {
                        fee_total += fee_taxable;
                    }
                    breakdown.push(LineBreakdown {
                        award_exercise: exercise,
                        fee_exercise,
                        coefficient: coefficients[i],
                        deflated_value: deflated[i],
                        share: shares[i],
                        withheld: None,
                        raw_months: None,
                        allocated_months: None,
                        award_taxable: None,
                        fee_taxable,
                    });
                }

                contributions.push(LineContribution {
                    award_exercise: exercise,
                    fee_exercise: Some(exercise),
                    award_taxable: (award_total + total_withholding) * proportion,
                    fee_taxable: fee_total,
                    withheld: total_withholding,
                    months: round_months(input.total_months),
                });
            }
        }

        let exercises =
            aggregate_exercises(&contributions, table, &self.tables.selic, &mut warnings);
        let net = aggregate_net(&exercises);

        let result = RraOutput {
            proportion,
            total_deflated_awards: total_deflated,
            total_withholding_original: total_withholding,
            calculation_path: path,
            deflation_applied: deflator.enabled(),
            bracket_table: Some(table.label.clone()),
            lines: breakdown,
            aggregate_net: net,
            aggregate_qualifier: Qualifier::of(net),
            aggregate_updated: aggregate_updated(&exercises),
            exercises,
        };

        Ok(envelope(input, warnings, start, result))
    }
}

/// Calculate with the built-in tables.
pub fn calculate_rra(input: &RraInput) -> RraResult<ComputationOutput<RraOutput>> {
    RraCalculator::default().calculate(input)
}

fn line_fee_taxable(line: &AwardLine, proportion: Rate) -> Money {
    line.fee_value.unwrap_or(Decimal::ZERO) * proportion
}

fn envelope(
    input: &RraInput,
    warnings: Vec<String>,
    start: Instant,
    result: RraOutput,
) -> ComputationOutput<RraOutput> {
    let assumptions = serde_json::json!({
        "gross_amount": input.gross_amount.to_string(),
        "taxable_amount": input.taxable_amount.to_string(),
        "total_months": input.total_months.to_string(),
        "num_lines": input.lines.len(),
        "num_certificates": input.certificates.len(),
        "use_deflation_hint": input.use_deflation_hint,
        "fiscal_year_rule": "calendar year + 1",
        "band_lookup": "inclusive upper bound",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "RRA monthly-equivalent progressive tax per fiscal exercise, IPCA-E deflated \
         apportionment of withholding across award lines",
        &assumptions,
        warnings,
        elapsed,
        result,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
