use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_core::amortization::affordability::{self, AffordabilityInput, DEFAULT_MAX_DTI};
use loan_core::amortization::interest::{self, SimpleInterestInput};
use loan_core::amortization::rates;
use loan_core::amortization::schedule::{self, LoanTerms};
use loan_core::{with_metadata, LendingConfig, LoanType, Rate};

use super::parse_enum;
use crate::input;

/// Arguments for a full amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate in percent (5.25 = 5.25%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan type; its reference rate is used when --rate is omitted
    #[arg(long, value_parser = parse_enum::<LoanType>)]
    pub loan_type: Option<LoanType>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Print only the headline figures, without the per-month rows
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for maximum affordable loan sizing
#[derive(Args)]
pub struct MaxLoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross monthly income
    #[arg(long)]
    pub monthly_income: Option<Decimal>,

    /// Monthly payments already committed elsewhere
    #[arg(long)]
    pub existing_debt: Option<Decimal>,

    /// Annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan type; its reference rate is used when --rate is omitted
    #[arg(long, value_parser = parse_enum::<LoanType>)]
    pub loan_type: Option<LoanType>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Debt-to-income ceiling (default 0.43)
    #[arg(long)]
    pub max_dti: Option<Decimal>,
}

/// Arguments for simple interest
#[derive(Args)]
pub struct SimpleInterestArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan type; its reference rate is used when --rate is omitted
    #[arg(long, value_parser = parse_enum::<LoanType>)]
    pub loan_type: Option<LoanType>,

    /// Day count
    #[arg(long)]
    pub days: Option<i64>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &LendingConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let terms: LoanTerms = match input::read_structured(args.input.as_deref())? {
        Some(terms) => terms,
        None => LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: resolve_rate(args.rate, args.loan_type)?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            start_date: args.start_date,
        },
    };

    let mut result = schedule::compute_schedule(&terms, &config.limits)?;

    let mut warnings = Vec::new();
    if let Some(last) = result.schedule.last() {
        if last.payment_amount != result.monthly_payment {
            warnings.push(format!(
                "Final payment of {} differs from the level payment to retire the balance exactly",
                last.payment_amount
            ));
        }
    }
    if terms.start_date.is_none() {
        warnings.push("No start date given; schedule rows carry no payment dates".into());
    }
    if args.summary {
        result.schedule.clear();
    }

    let output = with_metadata(
        "Level-payment annuity amortization; monthly rate = annual / 12; \
         half-up rounding to cents; final payment retires the residual balance",
        &json!({
            "principal": terms.principal.to_string(),
            "annual_rate_percent": terms.annual_rate_percent.to_string(),
            "term_months": terms.term_months,
            "rounding": "half-up to 0.01 per installment",
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_max_loan(
    args: MaxLoanArgs,
    config: &LendingConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: AffordabilityInput = match input::read_structured(args.input.as_deref())? {
        Some(request) => request,
        None => AffordabilityInput {
            monthly_income: args
                .monthly_income
                .ok_or("--monthly-income is required (or provide --input)")?,
            existing_debt: args.existing_debt,
            annual_rate_percent: resolve_rate(args.rate, args.loan_type)?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            max_dti_ratio: args.max_dti,
        },
    };

    let amount = affordability::max_affordable_loan(&request, &config.limits)?;

    let mut warnings = Vec::new();
    if amount.is_zero() {
        warnings.push("Existing debt already consumes the debt-to-income allowance".into());
    }

    let output = with_metadata(
        "Inverse annuity: principal whose level payment equals income x DTI ceiling \
         less existing monthly debt",
        &json!({
            "max_dti_ratio": request.max_dti_ratio.unwrap_or(DEFAULT_MAX_DTI).to_string(),
            "annual_rate_percent": request.annual_rate_percent.to_string(),
            "term_months": request.term_months,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        json!({ "max_affordable_loan": amount }),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_simple_interest(
    args: SimpleInterestArgs,
    config: &LendingConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: SimpleInterestInput = match input::read_structured(args.input.as_deref())? {
        Some(request) => request,
        None => SimpleInterestInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: resolve_rate(args.rate, args.loan_type)?,
            days: args.days.ok_or("--days is required (or provide --input)")?,
        },
    };

    let amount = interest::simple_interest(&request, &config.limits)?;

    let output = with_metadata(
        "Simple interest, Actual/365: principal x annual rate / 365 x days",
        &json!({
            "day_count": "ACT/365",
            "days": request.days,
        }),
        vec![],
        start.elapsed().as_micros() as u64,
        json!({ "interest": amount }),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_rates() -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let table: Vec<Value> = rates::reference_rates()
        .into_iter()
        .map(|(loan_type, rate)| {
            json!({
                "loan_type": loan_type,
                "annual_rate_percent": rate,
            })
        })
        .collect();

    let output = with_metadata(
        "Reference annual rates per loan type",
        &json!({}),
        vec!["Reference rates are indicative, not offers".into()],
        start.elapsed().as_micros() as u64,
        table,
    );
    Ok(serde_json::to_value(output)?)
}

/// `--rate` if given, otherwise the reference rate of `--loan-type`.
pub(crate) fn resolve_rate(
    rate: Option<Rate>,
    loan_type: Option<LoanType>,
) -> Result<Rate, Box<dyn std::error::Error>> {
    match (rate, loan_type) {
        (Some(rate), _) => Ok(rate),
        (None, Some(loan_type)) => {
            let rate = rates::reference_rate(loan_type);
            tracing::info!(%loan_type, %rate, "using reference rate");
            Ok(rate)
        }
        (None, None) => Err("--rate or --loan-type is required (or provide --input)".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_explicit_rate_wins() {
        let rate = resolve_rate(Some(dec!(3.1)), Some(LoanType::Mortgage)).unwrap();
        assert_eq!(rate, dec!(3.1));
    }

    #[test]
    fn test_loan_type_falls_back_to_reference_rate() {
        let rate = resolve_rate(None, Some(LoanType::Mortgage)).unwrap();
        assert_eq!(rate, dec!(6.75));
        assert!(resolve_rate(None, None).is_err());
    }
}
