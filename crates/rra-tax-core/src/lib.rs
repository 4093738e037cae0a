pub mod error;
pub mod rra;
pub mod tables;
pub mod types;

pub use error::RraError;
pub use rra::calculator::{calculate_rra, RraCalculator};
pub use tables::TaxTables;
pub use types::*;

/// Standard result type for all RRA operations
pub type RraResult<T> = Result<T, RraError>;
