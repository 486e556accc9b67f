use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use rental_returns_core::cashflow::analysis;
use rental_returns_core::cashflow::input::{CashflowInput, ManagementBase};

use crate::input;

/// Arguments for a full property analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the hold period in years
    #[arg(long)]
    pub hold_years: Option<u32>,

    /// Override annual rent growth (e.g. 0.03)
    #[arg(long, allow_hyphen_values = true)]
    pub rent_growth: Option<Decimal>,

    /// Override annual growth of flat operating expenses
    #[arg(long, allow_hyphen_values = true)]
    pub expense_growth: Option<Decimal>,

    /// Override annual property appreciation
    #[arg(long, allow_hyphen_values = true)]
    pub appreciation: Option<Decimal>,

    /// Override selling costs at exit, as a fraction of sale price
    #[arg(long)]
    pub exit_cost_rate: Option<Decimal>,

    /// Management fee base: EGI or GROSS_RENTS
    #[arg(long)]
    pub management_base: Option<ManagementBase>,
}

impl AnalyzeArgs {
    fn apply_overrides(&self, input: &mut CashflowInput) {
        if self.hold_years.is_some() {
            input.hold_years = self.hold_years;
        }
        if self.rent_growth.is_some() {
            input.rent_growth = self.rent_growth;
        }
        if self.expense_growth.is_some() {
            input.expense_growth = self.expense_growth;
        }
        if self.appreciation.is_some() {
            input.annual_appreciation = self.appreciation;
        }
        if self.exit_cost_rate.is_some() {
            input.exit_cost_rate = self.exit_cost_rate;
        }
        if self.management_base.is_some() {
            input.management_base = self.management_base;
        }
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut cf_input: CashflowInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for property analysis".into());
    };
    args.apply_overrides(&mut cf_input);
    debug!(source = args.input.as_deref().unwrap_or("stdin"), "loaded analysis input");

    let result = analysis::analyze_cashflow(&cf_input)?;
    Ok(serde_json::to_value(result)?)
}
