use napi::Result as NapiResult;
use napi_derive::napi;

use levsim_core::leveraged_products::path::PathInput;
use levsim_core::leveraged_products::random_walk::RandomWalkParams;
use levsim_core::leveraged_products::{fees, path, payoff, CurveInput, DailyChanges};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Payoff curves
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_curve(input_json: String) -> NapiResult<String> {
    let input: CurveInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = input.resolve_prices().map_err(to_napi_error)?;
    let output = payoff::compute_curve(&input.scenario, &prices).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn estimate_fee_impact(input_json: String) -> NapiResult<String> {
    let input: CurveInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let prices = input.resolve_prices().map_err(to_napi_error)?;
    let output = fees::estimate_fee_impact(&input.scenario, &prices).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Daily paths
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_path(input_json: String) -> NapiResult<String> {
    let input: PathInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        path::simulate_dated_path(&input.scenario, &input.daily_changes, input.start_date)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn random_daily_changes(input_json: String) -> NapiResult<String> {
    let params: RandomWalkParams = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let changes = DailyChanges::random_walk(&params).map_err(to_napi_error)?;
    serde_json::to_string(&changes).map_err(to_napi_error)
}
