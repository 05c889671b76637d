//! Applicant risk scoring.
//!
//! Independent factors each contribute points and the sum selects a level:
//! 1. **Credit score** -- missing or out-of-range scores take a fixed charge.
//! 2. **Debt-to-income** -- (payment + expenses) / monthly income.
//! 3. **Employment status** and **tenure**.
//! 4. **Loan-to-income** -- requested principal / annual income.
//!
//! Assessment never fails. Anything missing or malformed pushes the score up
//! and blocks auto-approval; a non-positive income leaves DTI undefined and
//! drops that factor from the sum.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::policy::RiskPolicy;
use super::profile::{EmploymentStatus, RiskProfile};
use crate::types::{round_ratio, Money, Ratio};

const MONTHS_PER_YEAR: Decimal = dec!(12);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::VeryHigh => write!(f, "VERY_HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    CreditScore,
    DebtToIncome,
    EmploymentStatus,
    EmploymentTenure,
    LoanToIncome,
}

/// One line of the score breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: RiskFactorKind,
    pub points: u32,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Four digits, half-up. `None` when income is not positive.
    pub debt_to_income_ratio: Option<Ratio>,
    /// Four digits, half-up. `None` when income is not positive.
    pub loan_to_income_ratio: Option<Ratio>,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub requires_manual_review: bool,
    pub eligible_for_auto_approval: bool,
    pub factors: Vec<RiskFactor>,
}

/// `(monthly_payment + monthly_expenses) / (annual_income / 12)`, rounded
/// half-up to four digits. Undefined for a non-positive income, or when the
/// ratio is too large to represent.
pub fn debt_to_income(
    monthly_payment: Money,
    monthly_expenses: Money,
    annual_income: Money,
) -> Option<Ratio> {
    if annual_income <= Decimal::ZERO {
        return None;
    }
    let ratio = monthly_payment
        .checked_add(monthly_expenses.max(Decimal::ZERO))
        .and_then(|obligations| obligations.checked_mul(MONTHS_PER_YEAR))
        .and_then(|annual| annual.checked_div(annual_income));
    if ratio.is_none() {
        warn!(
            %monthly_payment,
            %monthly_expenses,
            %annual_income,
            "debt-to-income overflows, treating as undefined"
        );
    }
    ratio.map(round_ratio)
}

/// Score an applicant against `policy` given the loan's monthly payment.
pub fn assess(profile: &RiskProfile, monthly_payment: Money, policy: &RiskPolicy) -> RiskAssessment {
    let mut factors = Vec::with_capacity(5);

    // -- Credit score ----------------------------------------------------------
    let credit_score = profile.usable_credit_score();
    match (profile.credit_score, credit_score) {
        (_, Some(score)) => factors.push(RiskFactor {
            factor: RiskFactorKind::CreditScore,
            points: policy.credit_score_points(score),
            detail: format!("credit score {score}"),
        }),
        (Some(raw), None) => {
            warn!(credit_score = raw, "credit score out of range, scoring as missing");
            factors.push(RiskFactor {
                factor: RiskFactorKind::CreditScore,
                points: policy.missing_credit_score_points,
                detail: format!("credit score {raw} out of range"),
            });
        }
        (None, None) => factors.push(RiskFactor {
            factor: RiskFactorKind::CreditScore,
            points: policy.missing_credit_score_points,
            detail: "no credit score".into(),
        }),
    }

    // -- Debt-to-income --------------------------------------------------------
    if profile.monthly_expenses < Decimal::ZERO {
        warn!(expenses = %profile.monthly_expenses, "negative monthly expenses, using zero");
    }
    let dti = debt_to_income(
        monthly_payment,
        profile.monthly_expenses,
        profile.annual_income,
    );
    match dti {
        Some(ratio) => factors.push(RiskFactor {
            factor: RiskFactorKind::DebtToIncome,
            points: RiskPolicy::ratio_points(&policy.debt_to_income_bands, ratio),
            detail: format!("debt-to-income {ratio}"),
        }),
        None if profile.annual_income <= Decimal::ZERO => {
            warn!(income = %profile.annual_income, "non-positive income, debt-to-income undefined");
        }
        None => {}
    }

    // -- Employment ------------------------------------------------------------
    let status = profile.employment_status;
    factors.push(RiskFactor {
        factor: RiskFactorKind::EmploymentStatus,
        points: policy.employment_points.for_status(status),
        detail: format!("employment status {status}"),
    });

    if let Some(years) = profile.employment_years {
        if years < policy.min_employment_years {
            factors.push(RiskFactor {
                factor: RiskFactorKind::EmploymentTenure,
                points: policy.short_employment_points,
                detail: format!("{years} years with current employer"),
            });
        }
    }

    // -- Loan-to-income --------------------------------------------------------
    // An unrepresentable ratio takes the top band, like a missing income.
    let lti = if profile.annual_income > Decimal::ZERO {
        profile
            .requested_loan_amount
            .checked_div(profile.annual_income)
            .map(round_ratio)
    } else {
        None
    };
    match lti {
        Some(ratio) => factors.push(RiskFactor {
            factor: RiskFactorKind::LoanToIncome,
            points: RiskPolicy::ratio_points(&policy.loan_to_income_bands, ratio),
            detail: format!("loan-to-income {ratio}"),
        }),
        None => factors.push(RiskFactor {
            factor: RiskFactorKind::LoanToIncome,
            points: RiskPolicy::max_ratio_points(&policy.loan_to_income_bands),
            detail: "no positive income to support the loan".into(),
        }),
    }

    // -- Classification --------------------------------------------------------
    let risk_score: u32 = factors.iter().map(|f| f.points).sum();
    let levels = &policy.levels;
    let risk_level = if risk_score >= levels.very_high {
        RiskLevel::VeryHigh
    } else if risk_score >= levels.high {
        RiskLevel::High
    } else if risk_score >= levels.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    let requires_manual_review = risk_level >= RiskLevel::High;

    let rules = &policy.auto_approval;
    let eligible_for_auto_approval = risk_level == RiskLevel::Low
        && credit_score.is_some_and(|s| s >= rules.min_credit_score)
        && dti.is_some_and(|r| r <= rules.max_debt_to_income)
        && status == EmploymentStatus::FullTime
        && profile
            .employment_years
            .is_some_and(|y| y >= rules.min_employment_years);

    debug!(
        risk_score,
        %risk_level,
        requires_manual_review,
        eligible_for_auto_approval,
        "assessed applicant risk"
    );

    RiskAssessment {
        debt_to_income_ratio: dti,
        loan_to_income_ratio: lti,
        risk_score,
        risk_level,
        requires_manual_review,
        eligible_for_auto_approval,
        factors,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
