use std::time::Instant;

use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use loan_core::application::workflow::{self, ApplicationAction, LoanApplication};
use loan_core::{with_metadata, LendingConfig};

use crate::input;

/// Arguments for an application lifecycle action
#[derive(Args)]
pub struct ApplicationArgs {
    #[command(subcommand)]
    pub action: ActionCommand,

    /// Path to the application JSON (or pipe it on stdin)
    #[arg(long, global = true)]
    pub input: Option<String>,
}

#[derive(Subcommand)]
pub enum ActionCommand {
    /// DRAFT -> SUBMITTED; runs the schedule and the risk assessment
    Submit,
    /// SUBMITTED -> UNDER_REVIEW
    StartReview,
    /// UNDER_REVIEW -> ADDITIONAL_INFO_REQUIRED
    RequestInfo {
        #[arg(long)]
        notes: Option<String>,
    },
    /// ADDITIONAL_INFO_REQUIRED -> UNDER_REVIEW
    ResumeReview,
    /// UNDER_REVIEW -> APPROVED
    Approve {
        #[arg(long)]
        notes: Option<String>,
    },
    /// UNDER_REVIEW -> REJECTED
    Reject {
        #[arg(long)]
        reason: String,
    },
    /// APPROVED -> FUNDED
    Fund,
    /// Any open state -> WITHDRAWN
    Withdraw,
}

impl From<ActionCommand> for ApplicationAction {
    fn from(command: ActionCommand) -> Self {
        match command {
            ActionCommand::Submit => ApplicationAction::Submit,
            ActionCommand::StartReview => ApplicationAction::StartReview,
            ActionCommand::RequestInfo { notes } => ApplicationAction::RequestInfo { notes },
            ActionCommand::ResumeReview => ApplicationAction::ResumeReview,
            ActionCommand::Approve { notes } => ApplicationAction::Approve { notes },
            ActionCommand::Reject { reason } => ApplicationAction::Reject { reason },
            ActionCommand::Fund => ApplicationAction::Fund,
            ActionCommand::Withdraw => ApplicationAction::Withdraw,
        }
    }
}

pub fn run_application(
    args: ApplicationArgs,
    config: &LendingConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let app: LoanApplication = input::read_structured(args.input.as_deref())?
        .ok_or("--input <application.json> or stdin required")?;

    let action = ApplicationAction::from(args.action);
    let now = Utc::now();
    let from = app.status;
    let app = workflow::apply_action(app, &action, &config.limits, &config.risk_policy, now)?;

    let mut warnings = Vec::new();
    if workflow::is_overdue_for_review(&app, now) {
        warnings.push(format!(
            "Waiting {} days for a decision, beyond the {}-day review window",
            workflow::application_age_days(&app, now),
            workflow::REVIEW_SLA_DAYS
        ));
    }
    if let Some(assessment) = app.assessment.as_ref() {
        if assessment.requires_manual_review && !app.status.is_terminal() {
            warnings.push(format!(
                "Risk level {} requires manual review",
                assessment.risk_level
            ));
        }
    }

    let output = with_metadata(
        "Application lifecycle transition",
        &json!({
            "action": action,
            "from_status": from,
            "evaluated_at": now,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        app,
    );
    Ok(serde_json::to_value(output)?)
}
