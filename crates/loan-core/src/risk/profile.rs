use serde::{Deserialize, Serialize};

use crate::types::Money;

pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 850;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    #[serde(alias = "EMPLOYED_FULL_TIME")]
    FullTime,
    #[serde(alias = "EMPLOYED_PART_TIME")]
    PartTime,
    SelfEmployed,
    Unemployed,
    Retired,
    Student,
}

impl std::fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmploymentStatus::FullTime => write!(f, "FULL_TIME"),
            EmploymentStatus::PartTime => write!(f, "PART_TIME"),
            EmploymentStatus::SelfEmployed => write!(f, "SELF_EMPLOYED"),
            EmploymentStatus::Unemployed => write!(f, "UNEMPLOYED"),
            EmploymentStatus::Retired => write!(f, "RETIRED"),
            EmploymentStatus::Student => write!(f, "STUDENT"),
        }
    }
}

/// Applicant financials as supplied with an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u16>,
    pub annual_income: Money,
    pub monthly_expenses: Money,
    pub employment_status: EmploymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_debt: Option<Money>,
    pub requested_loan_amount: Money,
}

impl RiskProfile {
    /// The credit score if it lies within the bureau range.
    pub fn usable_credit_score(&self) -> Option<u16> {
        self.credit_score
            .filter(|s| (MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(s))
    }
}
