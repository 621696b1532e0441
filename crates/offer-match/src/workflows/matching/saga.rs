//! Step declarations and per-step outcomes for the coordinator workflows.
//!
//! Every workflow is a short ordered list of remote calls. Each call carries a declared
//! policy: a `Required` failure ends the workflow, a `BestEffort` failure is recorded and
//! the primary result stands. No step has a compensation; nothing is rolled back.

use serde::Serialize;

use super::port::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    LoadOffer,
    CheckApplication,
    Apply,
    Respond,
    LoadStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    FetchOffer,
    FetchCompany,
    CheckApplication,
    CreateApplication,
    NotifyCompany,
    UpdateResponse,
    FetchOriginal,
    CreateFollowUp,
    FetchNotification,
}

impl WorkflowStep {
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowStep::FetchOffer => "fetch_offer",
            WorkflowStep::FetchCompany => "fetch_company",
            WorkflowStep::CheckApplication => "check_application",
            WorkflowStep::CreateApplication => "create_application",
            WorkflowStep::NotifyCompany => "notify_company",
            WorkflowStep::UpdateResponse => "update_response",
            WorkflowStep::FetchOriginal => "fetch_original",
            WorkflowStep::CreateFollowUp => "create_follow_up",
            WorkflowStep::FetchNotification => "fetch_notification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Failure ends the workflow and is reported through view state.
    Required,
    /// Failure is logged and traced; earlier steps stand.
    BestEffort,
}

impl Workflow {
    /// Ordered steps with their declared policy.
    pub fn plan(self) -> &'static [(WorkflowStep, StepPolicy)] {
        use StepPolicy::*;
        use WorkflowStep::*;
        match self {
            Workflow::LoadOffer => &[(FetchOffer, Required), (FetchCompany, BestEffort)],
            Workflow::CheckApplication => &[(CheckApplication, Required)],
            Workflow::Apply => &[(CreateApplication, Required), (NotifyCompany, BestEffort)],
            Workflow::Respond => &[
                (UpdateResponse, Required),
                (FetchOriginal, BestEffort),
                (CreateFollowUp, BestEffort),
            ],
            Workflow::LoadStatus => &[(FetchNotification, Required)],
        }
    }

    pub fn policy_of(self, step: WorkflowStep) -> Option<StepPolicy> {
        self.plan()
            .iter()
            .find(|(planned, _)| *planned == step)
            .map(|(_, policy)| *policy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: WorkflowStep,
    pub policy: StepPolicy,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Ordered record of what each step of one workflow run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowTrace {
    pub workflow: Workflow,
    pub steps: Vec<StepRecord>,
}

impl WorkflowTrace {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            steps: Vec::with_capacity(workflow.plan().len()),
        }
    }

    fn push(&mut self, step: WorkflowStep, outcome: StepOutcome) {
        let policy = self.workflow.policy_of(step);
        debug_assert!(
            policy.is_some(),
            "{} is not part of {:?}",
            step.label(),
            self.workflow
        );
        let policy = policy.unwrap_or(StepPolicy::BestEffort);
        self.steps.push(StepRecord {
            step,
            policy,
            outcome,
        });
    }

    pub fn completed(&mut self, step: WorkflowStep) {
        self.push(step, StepOutcome::Completed);
    }

    pub fn failed(&mut self, step: WorkflowStep, error: &PortError) {
        self.push(
            step,
            StepOutcome::Failed {
                reason: error.to_string(),
            },
        );
    }

    pub fn skipped(&mut self, step: WorkflowStep, reason: impl Into<String>) {
        self.push(
            step,
            StepOutcome::Skipped {
                reason: reason.into(),
            },
        );
    }

    pub fn outcome_of(&self, step: WorkflowStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.step == step)
            .map(|record| &record.outcome)
    }

    pub fn first_failure(&self) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|record| matches!(record.outcome, StepOutcome::Failed { .. }))
    }

    /// A required step failed, so the workflow did not achieve its primary effect.
    pub fn aborted(&self) -> bool {
        self.steps.iter().any(|record| {
            record.policy == StepPolicy::Required
                && matches!(record.outcome, StepOutcome::Failed { .. })
        })
    }

    /// The primary effect stands but a best-effort step failed.
    pub fn partially_failed(&self) -> bool {
        !self.aborted()
            && self.steps.iter().any(|record| {
                record.policy == StepPolicy::BestEffort
                    && matches!(record.outcome, StepOutcome::Failed { .. })
            })
    }
}
