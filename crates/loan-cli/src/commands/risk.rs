use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use loan_core::amortization::schedule::{self, LoanTerms};
use loan_core::risk::assessment;
use loan_core::risk::profile::{EmploymentStatus, RiskProfile};
use loan_core::{with_metadata, LendingConfig, LoanType, Money};

use super::amortization::resolve_rate;
use super::parse_enum;
use crate::input;

/// Arguments for applicant risk scoring
#[derive(Args)]
pub struct AssessArgs {
    /// Path to JSON input file: {"profile": {...}, "monthly_payment": "..."}
    #[arg(long)]
    pub input: Option<String>,

    /// Credit score (300-850); omit when the applicant has none
    #[arg(long)]
    pub credit_score: Option<u16>,

    /// Gross annual income
    #[arg(long)]
    pub annual_income: Option<Decimal>,

    /// Monthly living expenses
    #[arg(long)]
    pub monthly_expenses: Option<Decimal>,

    /// Employment status (full-time, part-time, self-employed, unemployed, retired, student)
    #[arg(long, value_parser = parse_enum::<EmploymentStatus>)]
    pub employment_status: Option<EmploymentStatus>,

    /// Years with the current employer
    #[arg(long)]
    pub employment_years: Option<u32>,

    /// Outstanding debt balance
    #[arg(long)]
    pub existing_debt: Option<Decimal>,

    /// Requested loan amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Monthly payment on the requested loan; derived from --rate/--term when omitted
    #[arg(long)]
    pub monthly_payment: Option<Decimal>,

    /// Annual rate in percent, used to derive the payment
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan type; its reference rate is used when --rate is omitted
    #[arg(long, value_parser = parse_enum::<LoanType>)]
    pub loan_type: Option<LoanType>,

    /// Term in months, used to derive the payment
    #[arg(long)]
    pub term: Option<u32>,
}

#[derive(Deserialize)]
struct AssessRequest {
    profile: RiskProfile,
    monthly_payment: Money,
}

pub fn run_assess(
    args: AssessArgs,
    config: &LendingConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let request = match input::read_structured::<AssessRequest>(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let profile = RiskProfile {
                credit_score: args.credit_score,
                annual_income: args
                    .annual_income
                    .ok_or("--annual-income is required (or provide --input)")?,
                monthly_expenses: args
                    .monthly_expenses
                    .ok_or("--monthly-expenses is required (or provide --input)")?,
                employment_status: args
                    .employment_status
                    .ok_or("--employment-status is required (or provide --input)")?,
                employment_years: args.employment_years,
                existing_debt: args.existing_debt,
                requested_loan_amount: args
                    .amount
                    .ok_or("--amount is required (or provide --input)")?,
            };
            let monthly_payment = match args.monthly_payment {
                Some(payment) => payment,
                None => {
                    let terms = LoanTerms {
                        principal: profile.requested_loan_amount,
                        annual_rate_percent: resolve_rate(args.rate, args.loan_type)?,
                        term_months: args
                            .term
                            .ok_or("--monthly-payment or --term is required")?,
                        start_date: None,
                    };
                    let payment = schedule::compute_schedule(&terms, &config.limits)?.monthly_payment;
                    warnings.push(format!(
                        "Monthly payment {payment} derived from {}% over {} months",
                        terms.annual_rate_percent, terms.term_months
                    ));
                    payment
                }
            };
            AssessRequest {
                profile,
                monthly_payment,
            }
        }
    };

    if request.profile.credit_score.is_none() {
        warnings.push("No credit score supplied; scored as missing".into());
    } else if request.profile.usable_credit_score().is_none() {
        warnings.push("Credit score outside 300-850; scored as missing".into());
    }
    if request.profile.employment_years.is_none() {
        warnings.push("Employment tenure unknown; not eligible for auto-approval".into());
    }

    let result = assessment::assess(
        &request.profile,
        request.monthly_payment,
        &config.risk_policy,
    );

    let output = with_metadata(
        "Additive points score over credit score, debt-to-income, employment, \
         tenure and loan-to-income; level by threshold",
        &json!({
            "monthly_payment": request.monthly_payment.to_string(),
            "level_thresholds": config.risk_policy.levels,
            "auto_approval": config.risk_policy.auto_approval,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
