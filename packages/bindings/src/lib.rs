use napi::Result as NapiResult;
use napi_derive::napi;

use quota_capital_core::deal::DealStructure;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Rate solving
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct RateBindingInput {
    cash_flows: Vec<rust_decimal::Decimal>,
}

#[napi]
pub fn solve_rate(input_json: String) -> NapiResult<String> {
    let input: RateBindingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let solution = quota_capital_core::rate::solve(&input.cash_flows);
    serde_json::to_string(&solution).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule and cash flows
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct ScheduleBindingOutput {
    schedule: Vec<quota_capital_core::schedule::ScheduleRow>,
    peak_balance: quota_capital_core::schedule::PeakBalance,
    suggested_installment: rust_decimal::Decimal,
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let deal: DealStructure = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    deal.validate().map_err(to_napi_error)?;
    let schedule = quota_capital_core::schedule::build_schedule(&deal);
    let output = ScheduleBindingOutput {
        peak_balance: quota_capital_core::schedule::find_peak_balance(&schedule),
        suggested_installment: quota_capital_core::schedule::suggested_installment(&deal),
        schedule,
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(serde::Serialize)]
struct ProceedsBindingOutput {
    net_proceeds: rust_decimal::Decimal,
    cash_flows: Vec<rust_decimal::Decimal>,
}

#[napi]
pub fn net_proceeds(input_json: String) -> NapiResult<String> {
    let deal: DealStructure = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    deal.validate().map_err(to_napi_error)?;
    let schedule = quota_capital_core::schedule::build_schedule(&deal);
    let output = ProceedsBindingOutput {
        net_proceeds: quota_capital_core::cashflow::net_proceeds(&deal),
        cash_flows: quota_capital_core::cashflow::project(&deal, &schedule),
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn minimal_cover(input_json: String) -> NapiResult<String> {
    let input: quota_capital_core::allocation::MinimalCoverInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    serde_json::to_string(&input.run()).map_err(to_napi_error)
}

#[napi]
pub fn maximal_fit(input_json: String) -> NapiResult<String> {
    let input: quota_capital_core::allocation::MaximalFitInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    serde_json::to_string(&input.run()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Full analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_all(input_json: String) -> NapiResult<String> {
    let input: quota_capital_core::engine::EngineInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    match quota_capital_core::engine::compute_all(&input) {
        Some(output) => serde_json::to_string(&output).map_err(to_napi_error),
        None => Ok("null".to_string()),
    }
}
