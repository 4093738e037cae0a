use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RraError;
use crate::types::Rate;
use crate::RraResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Month-keyed IPCA-E correction coefficients. Each coefficient brings a value
/// received in that month up to the common reference month (coefficient 1.0).
///
/// Keys are `"YYYY-MM"`; the serialized form is a plain map so replacement
/// tables can be supplied as JSON or YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonetaryIndexTable {
    pub coefficients: BTreeMap<String, Rate>,
}

impl Default for MonetaryIndexTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MonetaryIndexTable {
    /// Consolidated IPCA-E coefficients, 2020-01 through 2026-01 (reference month).
    pub fn builtin() -> Self {
        let coefficients = BUILTIN_IPCA_E
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect();
        Self { coefficients }
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Rate)>,
        K: Into<String>,
    {
        Self {
            coefficients: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn key_for(date: NaiveDate) -> String {
        format!("{:04}-{:02}", date.year(), date.month())
    }

    /// Coefficient for the month containing `date`, if the table covers it.
    pub fn coefficient_for(&self, date: NaiveDate) -> Option<Rate> {
        self.coefficients.get(&Self::key_for(date)).copied()
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub(crate) fn validate(&self) -> RraResult<()> {
        for (key, coefficient) in &self.coefficients {
            if parse_key(key).is_none() {
                return Err(RraError::InvalidTable {
                    table: "monetary_index".into(),
                    reason: format!("Key '{key}' is not a YYYY-MM month"),
                });
            }
            if *coefficient <= Decimal::ZERO {
                return Err(RraError::InvalidTable {
                    table: "monetary_index".into(),
                    reason: format!("Coefficient for {key} must be positive, got {coefficient}"),
                });
            }
        }
        Ok(())
    }
}

fn parse_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

// ---------------------------------------------------------------------------
// Built-in data
// ---------------------------------------------------------------------------

const BUILTIN_IPCA_E: &[(&str, Decimal)] = &[
    // 2020
    ("2020-01", dec!(1.3953248596)),
    ("2020-02", dec!(1.3854878955)),
    ("2020-03", dec!(1.3824465132)),
    ("2020-04", dec!(1.3821700792)),
    ("2020-05", dec!(1.3823083100)),
    ("2020-06", dec!(1.3905123327)),
    ("2020-07", dec!(1.3902342859)),
    ("2020-08", dec!(1.3860760577)),
    ("2020-09", dec!(1.3828953983)),
    ("2020-10", dec!(1.3767002472)),
    ("2020-11", dec!(1.3633879773)),
    ("2020-12", dec!(1.3529211162)),
    // 2021
    ("2021-01", dec!(1.3387305722)),
    ("2021-02", dec!(1.3283692917)),
    ("2021-03", dec!(1.3220235785)),
    ("2021-04", dec!(1.3098420475)),
    ("2021-05", dec!(1.3020298683)),
    ("2021-06", dec!(1.2863280337)),
    ("2021-07", dec!(1.2856650964)),
    ("2021-08", dec!(1.2764645517)),
    ("2021-09", dec!(1.2652042340)),
    ("2021-10", dec!(1.2509434783)),
    ("2021-11", dec!(1.2381101564)),
    ("2021-12", dec!(1.2218149219)),
    // 2022
    ("2022-01", dec!(1.2122558254)),
    ("2022-02", dec!(1.2053673945)),
    ("2022-03", dec!(1.1935512372)),
    ("2022-04", dec!(1.1823192048)),
    ("2022-05", dec!(1.1622129212)),
    ("2022-06", dec!(1.1553030943)),
    ("2022-07", dec!(1.1474734828)),
    ("2022-08", dec!(1.1456868975)),
    ("2022-09", dec!(1.1544149338)),
    ("2022-10", dec!(1.1587031354)),
    ("2022-11", dec!(1.1568821719)),
    ("2022-12", dec!(1.1507531801)),
    // 2023
    ("2023-01", dec!(1.1444802190)),
    ("2023-02", dec!(1.1385382585)),
    ("2023-03", dec!(1.1295656337)),
    ("2023-04", dec!(1.1222074052)),
    ("2023-05", dec!(1.1158470743)),
    ("2023-06", dec!(1.1101831301)),
    ("2023-07", dec!(1.1091674237)),
    ("2023-08", dec!(1.1074178288)),
    ("2023-09", dec!(1.1074182528)),
    ("2023-10", dec!(1.1035553329)),
    ("2023-11", dec!(1.1012427731)),
    ("2023-12", dec!(1.0876203256)),
    // 2024
    ("2024-01", dec!(1.0932476345)),
    ("2024-02", dec!(1.0898680405)),
    ("2024-03", dec!(1.0814338564)),
    ("2024-04", dec!(1.0775545596)),
    ("2024-05", dec!(1.0752965389)),
    ("2024-06", dec!(1.0705859587)),
    ("2024-07", dec!(1.0664258938)),
    ("2024-08", dec!(1.0632371822)),
    ("2024-09", dec!(1.0612208826)),
    ("2024-10", dec!(1.0598430666)),
    ("2024-11", dec!(1.0541506531)),
    ("2024-12", dec!(1.0476551909)),
    // 2025
    ("2025-01", dec!(1.0441052331)),
    ("2025-02", dec!(1.0429579793)),
    ("2025-03", dec!(1.0302854681)),
    ("2025-04", dec!(1.0237335732)),
    ("2025-05", dec!(1.0193503666)),
    ("2025-06", dec!(1.0156938687)),
    ("2025-07", dec!(1.0130599129)),
    ("2025-08", dec!(1.0097278112)),
    ("2025-09", dec!(1.0111434119)),
    ("2025-10", dec!(1.0063131090)),
    ("2025-11", dec!(1.0045050000)),
    ("2025-12", dec!(1.0025000000)),
    // 2026
    ("2026-01", dec!(1.0000000000)),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
