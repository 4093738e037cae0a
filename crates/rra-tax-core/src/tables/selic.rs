use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RraError;
use crate::types::{Money, Rate};
use crate::RraResult;

/// Accumulated SELIC rate per fiscal exercise, applied to restitutions from
/// the exercise's filing deadline up to the reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelicTable {
    pub rates: BTreeMap<i32, Rate>,
}

impl Default for SelicTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SelicTable {
    pub fn builtin() -> Self {
        let rates = [
            (2016, dec!(0.8500)),
            (2017, dec!(0.7200)),
            (2018, dec!(0.5800)),
            (2019, dec!(0.4900)),
            (2020, dec!(0.4500)),
            (2021, dec!(0.4800)),
            (2022, dec!(0.4339)),
            (2023, dec!(0.3069)),
            (2024, dec!(0.1200)),
            (2025, dec!(0.0809)),
            (2026, dec!(0.0000)),
        ];
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    pub fn rate_for(&self, exercise: i32) -> Option<Rate> {
        self.rates.get(&exercise).copied()
    }

    pub(crate) fn validate(&self) -> RraResult<()> {
        match self.rates.iter().find(|(_, rate)| **rate < Decimal::ZERO) {
            Some((exercise, rate)) => Err(RraError::InvalidTable {
                table: "selic".into(),
                reason: format!("Rate for exercise {exercise} is negative ({rate})"),
            }),
            None => Ok(()),
        }
    }
}

/// Restitution updated by `rate`. Amounts owed (net ≤ 0) are not updated and
/// contribute nothing.
pub fn updated_restitution(net: Money, rate: Rate) -> Money {
    if net > Decimal::ZERO {
        net * (Decimal::ONE + rate)
    } else {
        Decimal::ZERO
    }
}
