pub mod brackets;
pub mod monetary_index;
pub mod selic;

use serde::{Deserialize, Serialize};

use crate::RraResult;

pub use brackets::{end_of_month, Band, BracketSchedule, BracketTable};
pub use monetary_index::MonetaryIndexTable;
pub use selic::SelicTable;

/// Static lookup tables injected into the calculator.
///
/// Every field falls back to its built-in values when omitted from a
/// serialized configuration, so a file may override a single table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxTables {
    #[serde(default)]
    pub monetary_index: MonetaryIndexTable,
    #[serde(default)]
    pub brackets: BracketSchedule,
    #[serde(default)]
    pub selic: SelicTable,
}

impl TaxTables {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> RraResult<()> {
        self.monetary_index.validate()?;
        self.brackets.validate()?;
        self.selic.validate()?;
        Ok(())
    }
}
