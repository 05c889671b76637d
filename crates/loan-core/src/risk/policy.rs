//! The scoring policy table.
//!
//! `RiskPolicy::default()` reproduces the production weights exactly; a
//! deployment may override any subset through [`crate::config::LendingConfig`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::profile::EmploymentStatus;
use crate::error::LoanError;
use crate::types::Ratio;
use crate::LoanResult;

/// Points charged when a credit score is strictly below `below`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditScoreBand {
    pub below: u16,
    pub points: u32,
}

/// Points charged when a ratio is strictly above `above`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioBand {
    pub above: Ratio,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmploymentPoints {
    pub full_time: u32,
    pub part_time: u32,
    pub self_employed: u32,
    pub unemployed: u32,
    pub retired: u32,
    pub student: u32,
}

impl Default for EmploymentPoints {
    fn default() -> Self {
        EmploymentPoints {
            full_time: 0,
            part_time: 15,
            self_employed: 10,
            unemployed: 40,
            retired: 5,
            student: 20,
        }
    }
}

impl EmploymentPoints {
    pub fn for_status(&self, status: EmploymentStatus) -> u32 {
        match status {
            EmploymentStatus::FullTime => self.full_time,
            EmploymentStatus::PartTime => self.part_time,
            EmploymentStatus::SelfEmployed => self.self_employed,
            EmploymentStatus::Unemployed => self.unemployed,
            EmploymentStatus::Retired => self.retired,
            EmploymentStatus::Student => self.student,
        }
    }
}

/// Minimum total points for each level above LOW.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub medium: u32,
    pub high: u32,
    pub very_high: u32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        LevelThresholds {
            medium: 25,
            high: 40,
            very_high: 60,
        }
    }
}

/// Every conjunct must hold for an application to skip manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoApprovalRules {
    pub min_credit_score: u16,
    pub max_debt_to_income: Ratio,
    pub min_employment_years: u32,
}

impl Default for AutoApprovalRules {
    fn default() -> Self {
        AutoApprovalRules {
            min_credit_score: 750,
            max_debt_to_income: dec!(0.28),
            min_employment_years: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub missing_credit_score_points: u32,
    /// Ascending by `below`; the first matching band applies.
    pub credit_score_bands: Vec<CreditScoreBand>,
    /// Descending by `above`; the first matching band applies.
    pub debt_to_income_bands: Vec<RatioBand>,
    pub employment_points: EmploymentPoints,
    pub min_employment_years: u32,
    pub short_employment_points: u32,
    /// Descending by `above`; the first matching band applies.
    pub loan_to_income_bands: Vec<RatioBand>,
    pub levels: LevelThresholds,
    pub auto_approval: AutoApprovalRules,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy {
            missing_credit_score_points: 25,
            credit_score_bands: vec![
                CreditScoreBand { below: 600, points: 30 },
                CreditScoreBand { below: 650, points: 20 },
                CreditScoreBand { below: 700, points: 10 },
            ],
            debt_to_income_bands: vec![
                RatioBand { above: dec!(0.43), points: 25 },
                RatioBand { above: dec!(0.36), points: 15 },
                RatioBand { above: dec!(0.28), points: 5 },
            ],
            employment_points: EmploymentPoints::default(),
            min_employment_years: 2,
            short_employment_points: 10,
            loan_to_income_bands: vec![
                RatioBand { above: dec!(0.5), points: 15 },
                RatioBand { above: dec!(0.3), points: 8 },
            ],
            levels: LevelThresholds::default(),
            auto_approval: AutoApprovalRules::default(),
        }
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> LoanResult<()> {
        if !self
            .credit_score_bands
            .windows(2)
            .all(|w| w[0].below < w[1].below)
        {
            return Err(LoanError::Config(
                "risk_policy.credit_score_bands must be strictly ascending by `below`".into(),
            ));
        }
        for (name, bands) in [
            ("debt_to_income_bands", &self.debt_to_income_bands),
            ("loan_to_income_bands", &self.loan_to_income_bands),
        ] {
            if !bands.windows(2).all(|w| w[0].above > w[1].above) {
                return Err(LoanError::Config(format!(
                    "risk_policy.{name} must be strictly descending by `above`"
                )));
            }
            if bands.iter().any(|b| b.above < Decimal::ZERO) {
                return Err(LoanError::Config(format!(
                    "risk_policy.{name} thresholds cannot be negative"
                )));
            }
        }
        let l = &self.levels;
        if !(l.medium < l.high && l.high < l.very_high) {
            return Err(LoanError::Config(
                "risk_policy.levels must satisfy medium < high < very_high".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn credit_score_points(&self, score: u16) -> u32 {
        self.credit_score_bands
            .iter()
            .find(|b| score < b.below)
            .map_or(0, |b| b.points)
    }

    pub(crate) fn ratio_points(bands: &[RatioBand], value: Ratio) -> u32 {
        bands
            .iter()
            .find(|b| value > b.above)
            .map_or(0, |b| b.points)
    }

    /// The heaviest charge in a band table.
    pub(crate) fn max_ratio_points(bands: &[RatioBand]) -> u32 {
        bands.iter().map(|b| b.points).max().unwrap_or(0)
    }
}
