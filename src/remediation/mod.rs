//! Remediation Executor.
//!
//! Remediating a workflow event is two steps, in order:
//!
//! 1. disable the workflow that triggered the event
//! 2. open a tracking issue in the repository
//!
//! The issue is only filed once the workflow is disabled. If the disable
//! request fails, remediation stops and the failure is returned, so the
//! operator logs show the workflow is still enabled.
//!
//! Nothing here deduplicates: a redelivered event disables the workflow
//! again (a no-op on GitHub's side) and files a second issue.

mod message;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::types::{IssueNumber, WorkflowRef};
use crate::webhooks::{EventKind, WorkflowEvent};

pub use message::{IssueContent, NOT_VALID_LABEL, render_issue};

/// Errors from remediation.
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("failed to resolve workflow of run {run_id}: {source}")]
    ResolveRun {
        run_id: u64,
        #[source]
        source: GitHubApiError,
    },

    #[error("failed to disable workflow {workflow}: {source}")]
    Disable {
        workflow: WorkflowRef,
        #[source]
        source: GitHubApiError,
    },

    #[error("workflow {workflow} disabled but issue creation failed: {source}")]
    CreateIssue {
        workflow: WorkflowRef,
        #[source]
        source: GitHubApiError,
    },

    #[error("unexpected {response} response to {effect}")]
    UnexpectedResponse {
        effect: &'static str,
        response: &'static str,
    },
}

/// What remediation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationReport {
    /// The workflow that was disabled.
    pub workflow: WorkflowRef,
    /// The tracking issue.
    pub issue: IssueNumber,
}

/// Disables non-compliant workflows and files tracking issues.
#[derive(Debug, Clone, Default)]
pub struct Remediator {
    assignees: Vec<String>,
}

impl Remediator {
    pub fn new(assignees: Vec<String>) -> Self {
        Self { assignees }
    }

    pub fn assignees(&self) -> &[String] {
        &self.assignees
    }

    /// Remediates `event` through `api`, which must be scoped to the
    /// event's repository.
    #[instrument(skip_all, fields(repo = %event.repo, workflow = %event.workflow))]
    pub async fn remediate<G>(
        &self,
        api: &G,
        kind: EventKind,
        event: &WorkflowEvent,
        reason: &str,
    ) -> Result<RemediationReport, RemediationError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let workflow = resolve_workflow(api, &event.workflow).await?;

        match api
            .interpret(GitHubEffect::DisableWorkflow {
                workflow: workflow.clone(),
            })
            .await
        {
            Ok(GitHubResponse::WorkflowDisabled) => {
                info!(workflow = %workflow, "Workflow disabled");
            }
            Ok(other) => {
                return Err(RemediationError::UnexpectedResponse {
                    effect: "disable_workflow",
                    response: other.name(),
                });
            }
            Err(source) => {
                error!(workflow = %workflow, error = %source, "Failed to disable workflow");
                return Err(RemediationError::Disable { workflow, source });
            }
        }

        let issue = render_issue(kind, event, &workflow, reason, Utc::now());
        let response = api
            .interpret(GitHubEffect::CreateIssue {
                title: issue.title,
                body: issue.body,
                assignees: self.assignees.clone(),
                labels: issue.labels,
            })
            .await;

        match response {
            Ok(GitHubResponse::IssueCreated { number }) => {
                info!(issue = %number, "Tracking issue created");
                Ok(RemediationReport {
                    workflow,
                    issue: number,
                })
            }
            Ok(other) => Err(RemediationError::UnexpectedResponse {
                effect: "create_issue",
                response: other.name(),
            }),
            Err(source) => {
                error!(error = %source, "Failed to create tracking issue");
                Err(RemediationError::CreateIssue { workflow, source })
            }
        }
    }
}

/// Turns a run reference into the workflow id it belongs to. Other
/// references are already usable by the Actions API.
async fn resolve_workflow<G>(api: &G, workflow: &WorkflowRef) -> Result<WorkflowRef, RemediationError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let WorkflowRef::Run(run_id) = *workflow else {
        return Ok(workflow.clone());
    };

    match api.interpret(GitHubEffect::GetWorkflowRun { run_id }).await {
        Ok(GitHubResponse::WorkflowRun { workflow_id }) => Ok(WorkflowRef::Id(workflow_id)),
        Ok(other) => Err(RemediationError::UnexpectedResponse {
            effect: "get_workflow_run",
            response: other.name(),
        }),
        Err(source) => Err(RemediationError::ResolveRun { run_id, source }),
    }
}
