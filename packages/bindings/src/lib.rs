use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use debt_planner_core::{amortization, consolidation, milestones, risk, strategy};
use debt_planner_core::{ComputationOutput, DebtPlannerResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the engine entry point, serialise the envelope.
fn run_json<I, O>(
    input_json: &str,
    compute: impl FnOnce(&I) -> DebtPlannerResult<ComputationOutput<O>>,
) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = compute(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    run_json::<amortization::AmortizationInput, _>(&input_json, amortization::simulate_amortization)
}

#[napi]
pub fn debt_schedules(input_json: String) -> NapiResult<String> {
    run_json::<amortization::DebtScheduleInput, _>(&input_json, amortization::schedule_debts)
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[napi]
pub fn repayment_plan(input_json: String) -> NapiResult<String> {
    run_json::<strategy::RepaymentPlanInput, _>(&input_json, strategy::plan_repayment)
}

#[napi]
pub fn compare_strategies(input_json: String) -> NapiResult<String> {
    run_json::<strategy::StrategyComparisonInput, _>(&input_json, strategy::compare_strategies)
}

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

#[napi]
pub fn consolidation_scenario(input_json: String) -> NapiResult<String> {
    run_json::<consolidation::ConsolidationInput, _>(&input_json, consolidation::analyze_consolidation)
}

#[napi]
pub fn refinance_scenario(input_json: String) -> NapiResult<String> {
    run_json::<consolidation::RefinanceInput, _>(&input_json, consolidation::analyze_refinance)
}

// ---------------------------------------------------------------------------
// Risk and milestones
// ---------------------------------------------------------------------------

#[napi]
pub fn debt_to_income(input_json: String) -> NapiResult<String> {
    run_json::<risk::DebtToIncomeInput, _>(&input_json, risk::assess_debt_to_income)
}

#[napi]
pub fn track_milestones(input_json: String) -> NapiResult<String> {
    run_json::<milestones::MilestoneTrackingInput, _>(&input_json, milestones::track_milestones)
}
