use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rental_returns_core::financing::amortization::{self, AmortizationScheduleInput};

use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.055)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, default_value_t = 30)]
    pub years: u32,

    /// Leading interest-only years
    #[arg(long, default_value_t = 0)]
    pub interest_only_years: u32,

    /// Number of years to tabulate (defaults to the full term)
    #[arg(long)]
    pub horizon: Option<u32>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: AmortizationScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let annual_rate = args.rate.ok_or("--rate is required (or provide --input)")?;

        AmortizationScheduleInput {
            name: None,
            principal,
            annual_rate,
            amort_years: args.years,
            interest_only_years: args.interest_only_years,
            years: args.horizon,
        }
    };

    let result = amortization::build_amortization_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
