use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Filing exercise for an award received on `award_date`: the following year.
pub fn exercise_of(award_date: NaiveDate) -> i32 {
    award_date.year() + 1
}

/// Filing exercise for fees paid in `fee_paid_year`. A missing (or zero) year
/// means the line contributes no fee grouping.
pub fn fee_exercise_of(fee_paid_year: Option<i32>) -> Option<i32> {
    fee_paid_year.filter(|year| *year != 0).map(|year| year + 1)
}

/// Distinct calendar years among the given dates.
pub fn calendar_years<I>(dates: I) -> BTreeSet<i32>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates.into_iter().map(|d| d.year()).collect()
}
