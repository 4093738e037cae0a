//! Income received cumulatively (RRA): per-exercise restitution engine.
//!
//! Pipeline: taxable proportion → fiscal exercise classification → deflation
//! → withholding and month apportionment → bracket evaluation → exercise
//! aggregation. [`calculator`] wires the stages together.

pub mod apportion;
pub mod bracket_selector;
pub mod calculator;
pub mod deflation;
pub mod exercise;
pub mod fiscal_year;
pub mod proportion;

pub use calculator::{
    AwardLine, CalculationPath, LineBreakdown, RraInput, RraOutput, WithholdingCertificate,
};
pub use exercise::{FiscalExercise, Qualifier};
