//! Level-payment amortization schedules.
//!
//! The monthly payment comes from the annuity formula
//! `P * r(1+r)^n / ((1+r)^n - 1)` evaluated at full decimal precision and
//! rounded to cents once. Each month's interest is rounded to cents on the
//! opening balance; the final installment absorbs whatever residue the
//! rounding left so the schedule retires the principal exactly.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LoanLimits;
use crate::error::LoanError;
use crate::types::{round_half_up, round_money, Money, Rate, PERIODIC_RATE_SCALE};
use crate::LoanResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// The terms of a fixed-rate loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Annual rate in percent (5.25 = 5.25% p.a.).
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    /// Date of the first payment. Without it the schedule carries no dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl LoanTerms {
    /// Build validated terms.
    pub fn new(
        principal: Money,
        annual_rate_percent: Rate,
        term_months: u32,
        start_date: Option<NaiveDate>,
        limits: &LoanLimits,
    ) -> LoanResult<Self> {
        let terms = LoanTerms {
            principal,
            annual_rate_percent,
            term_months,
            start_date,
        };
        terms.validate(limits)?;
        Ok(terms)
    }

    pub fn validate(&self, limits: &LoanLimits) -> LoanResult<()> {
        limits.check_principal("principal", self.principal)?;
        limits.check_annual_rate("annual_rate_percent", self.annual_rate_percent)?;
        limits.check_term("term_months", self.term_months)?;
        if let Some(start) = self.start_date {
            if start
                .checked_add_months(Months::new(self.term_months - 1))
                .is_none()
            {
                return Err(LoanError::validation(
                    "start_date",
                    "final payment date is out of range",
                ));
            }
        }
        Ok(())
    }
}

/// One month of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationScheduleEntry {
    pub payment_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
    pub cumulative_interest: Money,
}

/// A complete calculation: the level payment, totals and every installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCalculationResult {
    pub terms: LoanTerms,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_payments: Money,
    pub schedule: Vec<AmortizationScheduleEntry>,
    pub calculated_at: DateTime<Utc>,
}

impl LoanCalculationResult {
    /// True when the two results agree on every field except `calculated_at`.
    pub fn same_figures(&self, other: &LoanCalculationResult) -> bool {
        self.terms == other.terms
            && self.monthly_payment == other.monthly_payment
            && self.total_interest == other.total_interest
            && self.total_payments == other.total_payments
            && self.schedule == other.schedule
    }
}

/// Cache key for a calculation. Decimals are normalized so that `1000` and
/// `1000.00` map to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    pub principal: Money,
    pub annual_rate_percent: Rate,
    pub term_months: u32,
}

impl ScheduleKey {
    pub fn from_terms(terms: &LoanTerms) -> Self {
        ScheduleKey {
            principal: terms.principal.normalize(),
            annual_rate_percent: terms.annual_rate_percent.normalize(),
            term_months: terms.term_months,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute the level monthly payment and full amortization schedule.
///
/// All inputs are validated against `limits` before any arithmetic; a
/// failure names the offending field and no partial result is produced.
pub fn compute_schedule(
    terms: &LoanTerms,
    limits: &LoanLimits,
) -> LoanResult<LoanCalculationResult> {
    terms.validate(limits)?;

    let principal = terms.principal;
    let n = terms.term_months;
    let r = monthly_rate(terms.annual_rate_percent);
    let monthly_payment = level_payment(principal, r, n)?;

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut total_payments = Decimal::ZERO;

    for payment_number in 1..=n {
        let interest = round_money(balance * r);
        let mut principal_portion = monthly_payment - interest;
        let mut payment_amount = monthly_payment;

        if payment_number == n {
            if principal_portion != balance {
                principal_portion = balance;
                payment_amount = principal_portion + interest;
            }
        } else if principal_portion > balance || principal_portion < Decimal::ZERO {
            // Rounding drift can retire the loan early on tiny long-dated
            // loans, or leave a payment short of the interest due.
            warn!(
                payment_number,
                %principal_portion,
                %balance,
                "clamping principal portion to the outstanding balance"
            );
            principal_portion = principal_portion.clamp(Decimal::ZERO, balance);
            payment_amount = principal_portion + interest;
        }

        balance -= principal_portion;
        if balance < Decimal::ZERO {
            balance = Decimal::ZERO;
        }
        cumulative_interest += interest;
        total_payments += payment_amount;

        let payment_date = terms
            .start_date
            .and_then(|d| d.checked_add_months(Months::new(payment_number - 1)));

        schedule.push(AmortizationScheduleEntry {
            payment_number,
            payment_date,
            payment_amount,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            cumulative_interest,
        });
    }

    let total_interest = total_payments - principal;

    debug!(
        %principal,
        rate = %terms.annual_rate_percent,
        term_months = n,
        %monthly_payment,
        %total_interest,
        "computed amortization schedule"
    );

    Ok(LoanCalculationResult {
        terms: terms.clone(),
        monthly_payment,
        total_interest,
        total_payments,
        schedule,
        calculated_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Annual percentage to monthly decimal rate, carried at ten digits.
pub(crate) fn monthly_rate(annual_rate_percent: Rate) -> Rate {
    round_half_up(
        annual_rate_percent / dec!(100) / MONTHS_PER_YEAR,
        PERIODIC_RATE_SCALE,
    )
}

/// `(1 + r)^n`.
pub(crate) fn compound_factor(r: Rate, n: u32) -> LoanResult<Decimal> {
    (Decimal::ONE + r)
        .checked_powu(u64::from(n))
        .ok_or_else(|| LoanError::Arithmetic {
            context: format!("(1 + {r})^{n}"),
        })
}

/// Level payment for `principal` over `n` months at periodic rate `r`,
/// rounded half-up to cents exactly once.
pub(crate) fn level_payment(principal: Money, r: Rate, n: u32) -> LoanResult<Money> {
    if r.is_zero() {
        return Ok(round_money(principal / Decimal::from(n)));
    }
    let factor = compound_factor(r, n)?;
    let numerator = principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(factor))
        .ok_or_else(|| LoanError::Arithmetic {
            context: "annuity numerator".into(),
        })?;
    // factor > 1 whenever r > 0, so the denominator is never zero.
    Ok(round_money(numerator / (factor - Decimal::ONE)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
