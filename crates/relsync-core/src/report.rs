use serde::Serialize;

/// A ticket the step changed, and the repositories it added to a stage field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketChange {
    pub key: String,
    pub repos: Vec<String>,
}

/// A ticket store call that failed and was skipped over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub operation: String,
    pub error: String,
}

/// Outcome of one reconciliation step (merge, tagging, a release pass).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub repo: String,
    pub selected: Vec<String>,
    pub changed: Vec<TicketChange>,
    pub skipped: Vec<String>,
    pub failures: Vec<StepFailure>,
}

impl StepReport {
    pub fn new(step: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            repo: repo.into(),
            ..Self::default()
        }
    }
}

/// Everything one invocation did, across all of its steps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub dry_run: bool,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn changed_count(&self) -> usize {
        self.steps.iter().map(|s| s.changed.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.steps.iter().map(|s| s.failures.len()).sum()
    }
}
