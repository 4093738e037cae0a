use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use rra_tax_core::tables::BracketTable;

use super::calculate::load_calculator;

/// Arguments for table inspection
#[derive(Args)]
pub struct TablesArgs {
    /// Which table to show
    #[arg(long, value_enum, default_value = "brackets")]
    pub kind: TableKind,

    /// Path to replacement tables (JSON or YAML)
    #[arg(long)]
    pub tables: Option<String>,

    /// Certificate date: show only the bracket table in force for it
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TableKind {
    Brackets,
    Index,
    Selic,
}

pub fn run_tables(args: TablesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let calculator = load_calculator(args.tables.as_deref())?;
    let tables = calculator.tables();

    let rows: Vec<Value> = match args.kind {
        TableKind::Brackets => match args.date {
            Some(date) => {
                let table = tables
                    .brackets
                    .select(date)
                    .ok_or("bracket schedule is empty")?;
                bracket_rows(table)
            }
            None => tables.brackets.tables.iter().flat_map(bracket_rows).collect(),
        },
        TableKind::Index => tables
            .monetary_index
            .coefficients
            .iter()
            .map(|(month, coefficient)| json!({ "month": month, "coefficient": coefficient }))
            .collect(),
        TableKind::Selic => tables
            .selic
            .rates
            .iter()
            .map(|(exercise, rate)| json!({ "exercise": exercise, "rate": rate }))
            .collect(),
    };

    Ok(Value::Array(rows))
}

fn bracket_rows(table: &BracketTable) -> Vec<Value> {
    table
        .bands
        .iter()
        .map(|band| {
            json!({
                "table": table.label,
                "valid_through": table.valid_through,
                "min": band.min,
                "max": band.max,
                "rate": band.rate,
                "deduction": band.deduction,
            })
        })
        .collect()
}
