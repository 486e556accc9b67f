use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;

use rental_returns_core::cashflow::analysis;
use rental_returns_core::cashflow::input::CashflowInput;
use rental_returns_core::financing::amortization::{self, AmortizationScheduleInput};
use rental_returns_core::time_value::{self, IrrInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Property analysis
// ---------------------------------------------------------------------------

/// Full buy-hold-sell analysis. Takes and returns JSON; optional KPIs are `null`.
#[napi]
pub fn analyze_cashflow(input_json: String) -> NapiResult<String> {
    let input = CashflowInput::from_json(&input_json).map_err(to_napi_error)?;
    let output = analysis::analyze_cashflow(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: AmortizationScheduleInput = parse(&input_json)?;
    let output = amortization::build_amortization_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn irr_series(input_json: String) -> NapiResult<String> {
    let input: IrrInput = parse(&input_json)?;
    let output = time_value::irr_series(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
