//! Loan application records and the rules that move them between states.
//!
//! The record is plain data for the persistence layer to store as-is. Each
//! rule takes the record by value, checks the transition table and returns
//! the updated record; the caller supplies `now` so the rules stay pure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::status::ApplicationStatus;
use crate::amortization::schedule::{compute_schedule, LoanTerms};
use crate::config::LoanLimits;
use crate::error::LoanError;
use crate::risk::assessment::{assess, RiskAssessment};
use crate::risk::policy::RiskPolicy;
use crate::risk::profile::RiskProfile;
use crate::types::{LoanType, Money};
use crate::LoanResult;

/// Days an application may wait in the queue before it is overdue.
pub const REVIEW_SLA_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanPurpose {
    DebtConsolidation,
    HomeImprovement,
    MajorPurchase,
    MedicalExpenses,
    Vacation,
    Wedding,
    BusinessExpansion,
    Education,
    Other,
}

/// Headline figures of the calculation run at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub loan_type: LoanType,
    pub loan_purpose: LoanPurpose,
    pub terms: LoanTerms,
    pub profile: RiskProfile,
    #[serde(default = "default_status")]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawn_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

fn default_status() -> ApplicationStatus {
    ApplicationStatus::Draft
}

impl LoanApplication {
    pub fn draft(
        loan_type: LoanType,
        loan_purpose: LoanPurpose,
        terms: LoanTerms,
        profile: RiskProfile,
    ) -> Self {
        LoanApplication {
            loan_type,
            loan_purpose,
            terms,
            profile,
            status: ApplicationStatus::Draft,
            calculation: None,
            assessment: None,
            submitted_at: None,
            reviewed_at: None,
            approved_at: None,
            rejected_at: None,
            funded_at: None,
            withdrawn_at: None,
            review_notes: None,
            rejection_reason: None,
        }
    }
}

/// A requested state change, as sent by a reviewer or the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApplicationAction {
    Submit,
    StartReview,
    RequestInfo {
        #[serde(default)]
        notes: Option<String>,
    },
    ResumeReview,
    Approve {
        #[serde(default)]
        notes: Option<String>,
    },
    Reject {
        reason: String,
    },
    Fund,
    Withdraw,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// DRAFT -> SUBMITTED. Runs the amortization engine on the application's
/// terms and scores the applicant against the resulting payment.
pub fn submit(
    mut app: LoanApplication,
    limits: &LoanLimits,
    policy: &RiskPolicy,
    now: DateTime<Utc>,
) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::Submitted)?;
    let calculation = compute_schedule(&app.terms, limits)?;

    // The loan being scored is the one on the terms.
    let mut profile = app.profile.clone();
    if profile.requested_loan_amount != app.terms.principal {
        debug!(
            requested = %profile.requested_loan_amount,
            principal = %app.terms.principal,
            "scoring against the principal on the terms"
        );
        profile.requested_loan_amount = app.terms.principal;
    }
    let assessment = assess(&profile, calculation.monthly_payment, policy);

    app.calculation = Some(CalculationSummary {
        monthly_payment: calculation.monthly_payment,
        total_interest: calculation.total_interest,
        total_amount: app.terms.principal + calculation.total_interest,
    });
    app.assessment = Some(assessment);
    app.submitted_at = Some(now);
    Ok(moved(app, next))
}

/// SUBMITTED -> UNDER_REVIEW.
pub fn start_review(app: LoanApplication) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::UnderReview)?;
    if app.status != ApplicationStatus::Submitted {
        return Err(invalid(app.status, ApplicationStatus::UnderReview));
    }
    Ok(moved(app, next))
}

/// UNDER_REVIEW -> ADDITIONAL_INFO_REQUIRED.
pub fn request_additional_info(
    mut app: LoanApplication,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> LoanResult<LoanApplication> {
    let next = app
        .status
        .transition(ApplicationStatus::AdditionalInfoRequired)?;
    app.reviewed_at = Some(now);
    if notes.is_some() {
        app.review_notes = notes;
    }
    Ok(moved(app, next))
}

/// ADDITIONAL_INFO_REQUIRED -> UNDER_REVIEW.
pub fn resume_review(app: LoanApplication) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::UnderReview)?;
    if app.status != ApplicationStatus::AdditionalInfoRequired {
        return Err(invalid(app.status, ApplicationStatus::UnderReview));
    }
    Ok(moved(app, next))
}

/// UNDER_REVIEW -> APPROVED. The application must carry an assessment.
pub fn approve(
    mut app: LoanApplication,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::Approved)?;
    if app.assessment.is_none() {
        return Err(LoanError::validation(
            "assessment",
            "cannot approve an application that was never assessed",
        ));
    }
    app.approved_at = Some(now);
    app.reviewed_at = Some(now);
    app.review_notes = notes;
    Ok(moved(app, next))
}

/// UNDER_REVIEW -> REJECTED. A reason is mandatory.
pub fn reject(
    mut app: LoanApplication,
    reason: &str,
    now: DateTime<Utc>,
) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::Rejected)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(LoanError::validation("rejection_reason", "must not be empty"));
    }
    app.rejected_at = Some(now);
    app.reviewed_at = Some(now);
    app.rejection_reason = Some(reason.to_string());
    Ok(moved(app, next))
}

/// APPROVED -> FUNDED.
pub fn fund(mut app: LoanApplication, now: DateTime<Utc>) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::Funded)?;
    app.funded_at = Some(now);
    Ok(moved(app, next))
}

/// Any open state -> WITHDRAWN.
pub fn withdraw(mut app: LoanApplication, now: DateTime<Utc>) -> LoanResult<LoanApplication> {
    let next = app.status.transition(ApplicationStatus::Withdrawn)?;
    app.withdrawn_at = Some(now);
    Ok(moved(app, next))
}

/// Dispatch an [`ApplicationAction`] to its rule.
pub fn apply_action(
    app: LoanApplication,
    action: &ApplicationAction,
    limits: &LoanLimits,
    policy: &RiskPolicy,
    now: DateTime<Utc>,
) -> LoanResult<LoanApplication> {
    match action {
        ApplicationAction::Submit => submit(app, limits, policy, now),
        ApplicationAction::StartReview => start_review(app),
        ApplicationAction::RequestInfo { notes } => {
            request_additional_info(app, notes.clone(), now)
        }
        ApplicationAction::ResumeReview => resume_review(app),
        ApplicationAction::Approve { notes } => approve(app, notes.clone(), now),
        ApplicationAction::Reject { reason } => reject(app, reason, now),
        ApplicationAction::Fund => fund(app, now),
        ApplicationAction::Withdraw => withdraw(app, now),
    }
}

// ---------------------------------------------------------------------------
// Queue metrics
// ---------------------------------------------------------------------------

/// Whole days since submission; zero for an unsubmitted application.
pub fn application_age_days(app: &LoanApplication, now: DateTime<Utc>) -> i64 {
    app.submitted_at
        .map_or(0, |submitted| (now - submitted).num_days())
}

/// Still waiting on a decision more than three days after submission.
pub fn is_overdue_for_review(app: &LoanApplication, now: DateTime<Utc>) -> bool {
    matches!(
        app.status,
        ApplicationStatus::Submitted | ApplicationStatus::UnderReview
    ) && application_age_days(app, now) > REVIEW_SLA_DAYS
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn moved(mut app: LoanApplication, next: ApplicationStatus) -> LoanApplication {
    info!(from = %app.status, to = %next, "application status changed");
    app.status = next;
    app
}

fn invalid(from: ApplicationStatus, to: ApplicationStatus) -> LoanError {
    LoanError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::profile::EmploymentStatus;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn draft() -> LoanApplication {
        LoanApplication::draft(
            LoanType::Auto,
            LoanPurpose::MajorPurchase,
            LoanTerms {
                principal: dec!(20000),
                annual_rate_percent: dec!(4.5),
                term_months: 48,
                start_date: None,
            },
            RiskProfile {
                credit_score: Some(720),
                annual_income: dec!(85000),
                monthly_expenses: dec!(1500),
                employment_status: EmploymentStatus::FullTime,
                employment_years: Some(4),
                existing_debt: None,
                requested_loan_amount: dec!(20000),
            },
        )
    }

    #[test]
    fn test_submit_populates_calculation_and_assessment() {
        let app = submit(draft(), &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap();
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert_eq!(app.submitted_at, Some(now()));
        let calc = app.calculation.as_ref().unwrap();
        assert_eq!(calc.total_amount, dec!(20000) + calc.total_interest);
        assert!(app.assessment.is_some());
    }

    #[test]
    fn test_submit_twice_fails() {
        let app = submit(draft(), &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap();
        let err = submit(app, &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap_err();
        assert!(matches!(err, LoanError::InvalidTransition { .. }));
    }

    #[test]
    fn test_submit_with_invalid_terms_leaves_no_partial_state() {
        let mut app = draft();
        app.terms.principal = dec!(500);
        let err = submit(app, &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap_err();
        assert_eq!(err.field(), Some("principal"));
    }

    #[test]
    fn test_resume_review_only_from_info_required() {
        let app = submit(draft(), &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap();
        let err = resume_review(app).unwrap_err();
        assert!(matches!(err, LoanError::InvalidTransition { .. }));
    }

    #[test]
    fn test_reject_needs_reason() {
        let app = submit(draft(), &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap();
        let app = start_review(app).unwrap();
        let err = reject(app, "  ", now()).unwrap_err();
        assert_eq!(err.field(), Some("rejection_reason"));
    }

    #[test]
    fn test_overdue_after_three_days() {
        let app = submit(draft(), &LoanLimits::default(), &RiskPolicy::default(), now()).unwrap();
        assert!(!is_overdue_for_review(&app, now() + Duration::days(3)));
        assert!(is_overdue_for_review(&app, now() + Duration::days(4)));
        assert_eq!(application_age_days(&app, now() + Duration::hours(50)), 2);

        let app = withdraw(app, now()).unwrap();
        assert!(!is_overdue_for_review(&app, now() + Duration::days(10)));
    }

    #[test]
    fn test_action_serde_shape() {
        let action: ApplicationAction =
            serde_json::from_str(r#"{"action": "reject", "reason": "income unverified"}"#).unwrap();
        assert_eq!(
            action,
            ApplicationAction::Reject {
                reason: "income unverified".into()
            }
        );
        let action: ApplicationAction = serde_json::from_str(r#"{"action": "fund"}"#).unwrap();
        assert_eq!(action, ApplicationAction::Fund);
    }
}
