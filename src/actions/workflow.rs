//! `workflow-handling` action.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::enforcer::PolicyEnforcer;
use super::{ActionError, ActionOutcome};
use crate::clients::AppClient;
use crate::types::WorkflowRef;
use crate::webhooks::{EventKind, WorkflowEvent};

/// Enforces the policy on workflow events of one configured repository.
pub struct WorkflowAction<C> {
    client: Arc<C>,
    organization: String,
    repository: String,
    /// Only workflows with this name are checked when set.
    workflow: Option<String>,
    enforcer: PolicyEnforcer,
}

impl<C: AppClient> WorkflowAction<C> {
    pub fn new(
        client: Arc<C>,
        organization: String,
        repository: String,
        workflow: Option<String>,
        enforcer: PolicyEnforcer,
    ) -> Self {
        Self {
            client,
            organization,
            repository,
            workflow,
            enforcer,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn enforcer(&self) -> &PolicyEnforcer {
        &self.enforcer
    }

    fn matches(&self, event: &WorkflowEvent) -> bool {
        if event.repo.owner != self.organization {
            debug!(
                expected = %self.organization,
                actual = %event.repo.owner,
                "Organization does not match"
            );
            return false;
        }
        if event.repo.repo != self.repository {
            debug!(
                expected = %self.repository,
                actual = %event.repo.repo,
                "Repository does not match"
            );
            return false;
        }
        if let Some(workflow) = &self.workflow
            && !names_workflow(workflow, event)
        {
            debug!(
                expected = %workflow,
                actual = %event.workflow_name,
                "Workflow does not match"
            );
            return false;
        }
        true
    }

    pub async fn handle(
        &self,
        kind: EventKind,
        event: &WorkflowEvent,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        if !self.matches(event) {
            return Ok(ActionOutcome::Skipped);
        }

        let api = self.client.api(event.repo.clone());
        self.enforcer.enforce(api, kind, event, cancel).await
    }
}

/// Whether `filter` names the event's workflow.
///
/// Dispatch events only carry the workflow file, so there the filter also
/// matches the file name with or without its extension.
fn names_workflow(filter: &str, event: &WorkflowEvent) -> bool {
    if filter == event.workflow_name {
        return true;
    }
    match &event.workflow {
        WorkflowRef::File(file) => {
            file == filter
                || [".yml", ".yaml"]
                    .into_iter()
                    .any(|ext| file.strip_suffix(ext) == Some(filter))
        }
        WorkflowRef::Id(_) | WorkflowRef::Run(_) => false,
    }
}
