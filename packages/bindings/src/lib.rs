use std::sync::OnceLock;

use chrono::Utc;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loan_core::amortization::cache::ScheduleCache;
use loan_core::amortization::schedule::LoanTerms;
use loan_core::application::workflow::{ApplicationAction, LoanApplication};
use loan_core::risk::profile::RiskProfile;
use loan_core::{LendingConfig, Money};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Optional lending config as JSON; the defaults when absent.
fn parse_config(config_json: Option<String>) -> NapiResult<LendingConfig> {
    match config_json {
        Some(json) => LendingConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(LendingConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

fn schedule_cache() -> &'static ScheduleCache {
    static CACHE: OnceLock<ScheduleCache> = OnceLock::new();
    CACHE.get_or_init(ScheduleCache::default)
}

#[napi]
pub fn compute_schedule(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = schedule_cache()
        .get_or_compute(&terms, &config.limits)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Empty the schedule cache, returning how many entries were dropped.
#[napi]
pub fn clear_schedule_cache() -> u32 {
    u32::try_from(schedule_cache().clear()).unwrap_or(u32::MAX)
}

#[napi]
pub fn max_affordable_loan(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: loan_core::amortization::affordability::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let amount =
        loan_core::amortization::affordability::max_affordable_loan(&input, &config.limits)
            .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "max_affordable_loan": amount }))
        .map_err(to_napi_error)
}

#[napi]
pub fn simple_interest(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: loan_core::amortization::interest::SimpleInterestInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let interest = loan_core::amortization::interest::simple_interest(&input, &config.limits)
        .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "interest": interest })).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AssessRequest {
    profile: RiskProfile,
    monthly_payment: Money,
}

#[napi]
pub fn assess_risk(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: AssessRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = loan_core::risk::assessment::assess(
        &input.profile,
        input.monthly_payment,
        &config.risk_policy,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[napi]
pub fn submit_application(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let app: LoanApplication = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = loan_core::application::workflow::submit(
        app,
        &config.limits,
        &config.risk_policy,
        Utc::now(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `action_json` is tagged by `action`, e.g. `{"action": "reject", "reason": "..."}`.
#[napi]
pub fn transition_application(
    input_json: String,
    action_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let app: LoanApplication = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let action: ApplicationAction = serde_json::from_str(&action_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = loan_core::application::workflow::apply_action(
        app,
        &action,
        &config.limits,
        &config.risk_policy,
        Utc::now(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
