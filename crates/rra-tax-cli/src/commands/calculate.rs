use clap::{Args, ValueEnum};
use serde_json::Value;

use rra_tax_core::rra::{CalculationPath, RraInput};
use rra_tax_core::{RraCalculator, TaxTables};

use crate::input;

/// Arguments for the restitution calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to a JSON or YAML input file (otherwise read from stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to replacement tables (JSON or YAML); built-in tables otherwise
    #[arg(long)]
    pub tables: Option<String>,

    /// Calculation regime
    #[arg(long, value_enum, default_value = "auto")]
    pub path: PathArg,

    /// Do not apply IPCA-E correction, even for multi-year lawsuits
    #[arg(long)]
    pub no_deflation: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PathArg {
    /// Single-year when every award falls in one calendar year
    Auto,
    SingleYear,
    MultiYear,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rra_input: RraInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("provide --input <file> or pipe the calculation JSON on stdin".into());
    };

    if args.no_deflation {
        rra_input.use_deflation_hint = Some(false);
    }

    let calculator = load_calculator(args.tables.as_deref())?;
    let output = match args.path {
        PathArg::Auto => calculator.calculate(&rra_input)?,
        PathArg::SingleYear => calculator.calculate_via(&rra_input, CalculationPath::SingleYear)?,
        PathArg::MultiYear => calculator.calculate_via(&rra_input, CalculationPath::MultiYear)?,
    };
    Ok(serde_json::to_value(output)?)
}

/// Calculator over the tables in `path`, or the built-in ones.
pub fn load_calculator(path: Option<&str>) -> Result<RraCalculator, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            tracing::debug!(path, "loading replacement tables");
            let tables: TaxTables = input::file::read_structured(path)?;
            Ok(RraCalculator::new(tables)?)
        }
        None => Ok(RraCalculator::default()),
    }
}
