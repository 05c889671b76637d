use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::LoanResult;

/// Lifecycle of a loan application.
///
/// ```text
/// DRAFT -> SUBMITTED -> UNDER_REVIEW -> APPROVED -> FUNDED
///                                    -> REJECTED
///                                    -> ADDITIONAL_INFO_REQUIRED -> UNDER_REVIEW
/// ```
///
/// WITHDRAWN is reachable from every state that is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    AdditionalInfoRequired,
    Approved,
    Rejected,
    Withdrawn,
    Funded,
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn | ApplicationStatus::Funded
        )
    }

    pub fn allowed_transitions(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Draft => &[Submitted, Withdrawn],
            Submitted => &[UnderReview, Withdrawn],
            UnderReview => &[Approved, Rejected, AdditionalInfoRequired, Withdrawn],
            AdditionalInfoRequired => &[UnderReview, Withdrawn],
            Approved => &[Funded, Withdrawn],
            Rejected | Withdrawn | Funded => &[],
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// `next` if the edge exists, `InvalidTransition` otherwise.
    pub fn transition(self, next: ApplicationStatus) -> LoanResult<ApplicationStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LoanError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Draft => write!(f, "DRAFT"),
            ApplicationStatus::Submitted => write!(f, "SUBMITTED"),
            ApplicationStatus::UnderReview => write!(f, "UNDER_REVIEW"),
            ApplicationStatus::AdditionalInfoRequired => write!(f, "ADDITIONAL_INFO_REQUIRED"),
            ApplicationStatus::Approved => write!(f, "APPROVED"),
            ApplicationStatus::Rejected => write!(f, "REJECTED"),
            ApplicationStatus::Withdrawn => write!(f, "WITHDRAWN"),
            ApplicationStatus::Funded => write!(f, "FUNDED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::AdditionalInfoRequired,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
        ApplicationStatus::Funded,
    ];

    #[test]
    fn test_terminal_states_have_no_exits() {
        for s in ALL {
            assert_eq!(s.is_terminal(), s.allowed_transitions().is_empty(), "{s}");
        }
    }

    #[test]
    fn test_withdrawal_from_every_open_state() {
        for s in ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(s.can_transition_to(ApplicationStatus::Withdrawn), "{s}");
        }
    }

    #[test]
    fn test_no_shortcut_to_approval() {
        assert!(!ApplicationStatus::Draft.can_transition_to(ApplicationStatus::Approved));
        assert!(!ApplicationStatus::Submitted.can_transition_to(ApplicationStatus::Approved));
        assert!(!ApplicationStatus::UnderReview.can_transition_to(ApplicationStatus::Funded));
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = ApplicationStatus::Funded
            .transition(ApplicationStatus::Draft)
            .unwrap_err();
        match err {
            LoanError::InvalidTransition { from, to } => {
                assert_eq!(from, "FUNDED");
                assert_eq!(to, "DRAFT");
            }
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }
    }
}
