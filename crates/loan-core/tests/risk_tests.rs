use loan_core::risk::assessment::{assess, RiskFactorKind, RiskLevel};
use loan_core::risk::policy::RiskPolicy;
use loan_core::risk::profile::{EmploymentStatus, RiskProfile};
use loan_core::LendingConfig;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn distressed_applicant() -> RiskProfile {
    // income 60k -> 5k/month; payment 1500 + expenses 1000 -> DTI 0.50;
    // 36k requested -> LTI 0.60
    RiskProfile {
        credit_score: Some(550),
        annual_income: dec!(60000),
        monthly_expenses: dec!(1000),
        employment_status: EmploymentStatus::Unemployed,
        employment_years: Some(0),
        existing_debt: Some(dec!(12000)),
        requested_loan_amount: dec!(36000),
    }
}

fn prime_applicant() -> RiskProfile {
    // income 120k -> 10k/month; payment 1200 + expenses 800 -> DTI 0.20
    RiskProfile {
        credit_score: Some(780),
        annual_income: dec!(120000),
        monthly_expenses: dec!(800),
        employment_status: EmploymentStatus::FullTime,
        employment_years: Some(5),
        existing_debt: None,
        requested_loan_amount: dec!(20000),
    }
}

// ===========================================================================
// Score floor / auto-approval gate
// ===========================================================================

#[test]
fn test_distressed_applicant_is_very_high() {
    let a = assess(&distressed_applicant(), dec!(1500), &RiskPolicy::default());
    assert_eq!(a.debt_to_income_ratio, Some(dec!(0.5)));
    assert_eq!(a.loan_to_income_ratio, Some(dec!(0.6)));
    // 30 credit + 25 DTI + 40 unemployed + 10 tenure + 15 LTI
    assert_eq!(a.risk_score, 120);
    assert!(a.risk_score >= 60);
    assert_eq!(a.risk_level, RiskLevel::VeryHigh);
    assert!(a.requires_manual_review);
    assert!(!a.eligible_for_auto_approval);
}

#[test]
fn test_prime_applicant_auto_approved() {
    let a = assess(&prime_applicant(), dec!(1200), &RiskPolicy::default());
    assert_eq!(a.debt_to_income_ratio, Some(dec!(0.2)));
    assert_eq!(a.risk_level, RiskLevel::Low);
    assert!(a.eligible_for_auto_approval);
    assert!(!a.requires_manual_review);
}

#[test]
fn test_each_missing_conjunct_blocks_auto_approval() {
    let policy = RiskPolicy::default();
    let payment = dec!(1200);

    let mut p = prime_applicant();
    p.employment_years = Some(1);
    let a = assess(&p, payment, &policy);
    assert_eq!(a.risk_level, RiskLevel::Low);
    assert!(!a.eligible_for_auto_approval);

    let mut p = prime_applicant();
    p.credit_score = Some(749);
    let a = assess(&p, payment, &policy);
    assert_eq!(a.risk_level, RiskLevel::Low);
    assert!(!a.eligible_for_auto_approval);

    let mut p = prime_applicant();
    p.employment_status = EmploymentStatus::Retired;
    let a = assess(&p, payment, &policy);
    assert_eq!(a.risk_level, RiskLevel::Low);
    assert!(!a.eligible_for_auto_approval);

    // DTI 0.29: (1200 + 1700) * 12 / 120000
    let mut p = prime_applicant();
    p.monthly_expenses = dec!(1700);
    let a = assess(&p, payment, &policy);
    assert_eq!(a.debt_to_income_ratio, Some(dec!(0.29)));
    assert_eq!(a.risk_level, RiskLevel::Low);
    assert!(!a.eligible_for_auto_approval);
}

#[test]
fn test_dti_boundary_is_inclusive_for_auto_approval() {
    // (1200 + 1600) * 12 / 120000 = 0.28 exactly
    let mut p = prime_applicant();
    p.monthly_expenses = dec!(1600);
    let a = assess(&p, dec!(1200), &RiskPolicy::default());
    assert_eq!(a.debt_to_income_ratio, Some(dec!(0.28)));
    assert!(a.eligible_for_auto_approval);
}

// ===========================================================================
// Degradation
// ===========================================================================

#[test]
fn test_non_positive_income_never_auto_approves() {
    let mut p = prime_applicant();
    p.annual_income = dec!(-1);
    let a = assess(&p, dec!(1200), &RiskPolicy::default());
    assert_eq!(a.debt_to_income_ratio, None);
    assert_eq!(a.loan_to_income_ratio, None);
    assert!(a
        .factors
        .iter()
        .all(|f| f.factor != RiskFactorKind::DebtToIncome));
    assert!(!a.eligible_for_auto_approval);
}

#[test]
fn test_factor_breakdown_sums_to_score() {
    let a = assess(&distressed_applicant(), dec!(1500), &RiskPolicy::default());
    let sum: u32 = a.factors.iter().map(|f| f.points).sum();
    assert_eq!(sum, a.risk_score);
    assert_eq!(a.factors.len(), 5);
}

#[test]
fn test_assessment_serializes_ratios_with_four_digits() {
    let a = assess(&prime_applicant(), dec!(1200), &RiskPolicy::default());
    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["debt_to_income_ratio"], serde_json::json!("0.2000"));
    assert_eq!(json["risk_level"], serde_json::json!("LOW"));
    assert_eq!(json["factors"][0]["factor"], serde_json::json!("credit_score"));
}

// ===========================================================================
// Policy from configuration
// ===========================================================================

#[test]
fn test_policy_loaded_from_yaml() {
    let yaml = r#"
risk_policy:
  missing_credit_score_points: 35
  levels:
    medium: 20
    high: 45
    very_high: 70
"#;
    let config = LendingConfig::from_yaml_str(yaml).unwrap();
    let mut p = prime_applicant();
    p.credit_score = None;
    let a = assess(&p, dec!(1200), &config.risk_policy);
    assert_eq!(a.risk_score, 35);
    assert_eq!(a.risk_level, RiskLevel::Medium);

    p.employment_status = EmploymentStatus::PartTime;
    let a = assess(&p, dec!(1200), &config.risk_policy);
    assert_eq!(a.risk_score, 50);
    assert_eq!(a.risk_level, RiskLevel::High);
    assert!(a.requires_manual_review);
}

#[test]
fn test_zero_payment_still_scores() {
    let a = assess(&prime_applicant(), Decimal::ZERO, &RiskPolicy::default());
    assert_eq!(a.debt_to_income_ratio, Some(dec!(0.08)));
    assert_eq!(a.risk_level, RiskLevel::Low);
}
