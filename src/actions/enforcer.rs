//! Validate, then remediate.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ActionError, ActionOutcome};
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::remediation::Remediator;
use crate::validator::{PolicyValidator, ValidationError, ValidationOutcome, ValidatorSettings};
use crate::webhooks::{EventKind, WorkflowEvent};

/// Runs the policy check for a workflow event and remediates on failure.
///
/// A timed-out validation is remediated like any other failure. A cancelled
/// one is not: cancellation comes from the dispatch giving up, not from the
/// repository.
#[derive(Debug, Clone)]
pub struct PolicyEnforcer {
    validator: PolicyValidator,
    remediator: Remediator,
}

impl PolicyEnforcer {
    pub fn new(settings: ValidatorSettings, assignees: Vec<String>) -> Self {
        Self {
            validator: PolicyValidator::new(settings),
            remediator: Remediator::new(assignees),
        }
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.validator
    }

    pub fn remediator(&self) -> &Remediator {
        &self.remediator
    }

    pub async fn enforce<G>(
        &self,
        api: G,
        kind: EventKind,
        event: &WorkflowEvent,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError>
    where
        G: GitHubInterpreter<Error = GitHubApiError> + Clone + Send + Sync + 'static,
    {
        let reason = match self.validator.validate(api.clone(), &event.repo, cancel).await {
            ValidationOutcome::Valid { path } => return Ok(ActionOutcome::Compliant { path }),
            ValidationOutcome::Invalid(ValidationError::Cancelled) => {
                return Err(ActionError::Cancelled);
            }
            ValidationOutcome::Invalid(err) => err.to_string(),
        };

        info!(
            repo = %event.repo,
            workflow = %event.workflow_name,
            reason = %reason,
            "Remediating workflow"
        );
        let report = self
            .remediator
            .remediate(&api, kind, event, &reason)
            .await?;

        Ok(ActionOutcome::Remediated {
            workflow: report.workflow,
            issue: report.issue,
        })
    }
}
