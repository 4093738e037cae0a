use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::RraError;
use crate::rra::calculator::WithholdingCertificate;
use crate::tables::{BracketSchedule, BracketTable};
use crate::types::{Money, Months};
use crate::RraResult;

/// Most recent certificate date; it decides which progressive table applies.
pub fn latest_certificate_date(certificates: &[WithholdingCertificate]) -> Option<NaiveDate> {
    certificates.iter().map(|c| c.certificate_date).max()
}

/// Picks the table in force for the latest certificate. Without any
/// certificate the latest table of the schedule is used.
pub fn select_table<'a>(
    schedule: &'a BracketSchedule,
    certificates: &[WithholdingCertificate],
    warnings: &mut Vec<String>,
) -> RraResult<&'a BracketTable> {
    let table = match latest_certificate_date(certificates) {
        Some(reference) => schedule.select(reference),
        None => {
            warn!("no withholding certificate; using the latest bracket table");
            warnings.push(
                "No withholding certificate supplied; the latest bracket table was applied"
                    .to_string(),
            );
            schedule.latest()
        }
    };

    let table = table.ok_or_else(|| RraError::InvalidTable {
        table: "brackets".into(),
        reason: "schedule has no tables".into(),
    })?;
    debug!(table = %table.label, "bracket table selected");
    Ok(table)
}

/// Tax due for one exercise under the monthly-equivalent formula:
/// `max(0, rate × base − deduction) × months` with `base = income / months`.
pub fn exercise_tax(table: &BracketTable, taxable_income: Money, months: Months) -> Money {
    if taxable_income <= Decimal::ZERO || months <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let base = taxable_income / months;
    table.monthly_tax(base) * months
}
