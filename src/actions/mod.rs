//! Action handlers.
//!
//! An action is one configured reaction to webhook events, acting through
//! one client:
//!
//! - [`WorkflowAction`] validates the repository a workflow event came from,
//!   for a statically configured organization/repository, and remediates
//!   when no valid policy file is found.
//! - [`RepoAction`] does the same for the repository its client is bound to.
//! - [`IssuesAction`] handles the fork-build comment command on pull
//!   requests.
//!
//! Handlers never fail on events that are not theirs: a mismatch is a
//! debug-logged [`ActionOutcome::Skipped`].

mod enforcer;
mod factory;
mod issues;
mod repo;
mod workflow;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::clients::{AppClient, ClientError};
use crate::config::ActionKind;
use crate::git::{ForkPusher, GitCli, GitError};
use crate::github::GitHubApiError;
use crate::remediation::RemediationError;
use crate::types::{IssueNumber, WorkflowRef};
use crate::webhooks::{EventKind, WebhookEvent};

pub use enforcer::PolicyEnforcer;
pub use factory::{build_action, build_actions};
pub use issues::{DEFAULT_ALLOWED_ASSOCIATIONS, DEFAULT_COMMAND, IssuesAction};
pub use repo::RepoAction;
pub use workflow::WorkflowAction;

/// What a handler did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The event was not for this handler.
    Skipped,
    /// The repository carries a valid policy file.
    Compliant { path: String },
    /// The workflow was disabled and a tracking issue filed.
    Remediated {
        workflow: WorkflowRef,
        issue: IssueNumber,
    },
    /// A fork head was pushed to `branch` of the target repository.
    ForkBuildTriggered { branch: String },
}

/// Errors from handling an event.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Remediation(#[from] RemediationError),

    #[error("{effect} failed: {source}")]
    GitHub {
        effect: &'static str,
        #[source]
        source: GitHubApiError,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("unexpected {response} response to {effect}")]
    UnexpectedResponse {
        effect: &'static str,
        response: &'static str,
    },

    #[error("no clone URL for the {0} repository")]
    MissingCloneUrl(&'static str),

    #[error("cancelled")]
    Cancelled,
}

/// A configured action.
pub enum ActionHandler<C, P = GitCli> {
    Workflow(WorkflowAction<C>),
    Repo(RepoAction<C>),
    Issues(IssuesAction<C, P>),
}

impl<C: AppClient, P: ForkPusher> ActionHandler<C, P> {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionHandler::Workflow(_) => ActionKind::WorkflowHandling,
            ActionHandler::Repo(_) => ActionKind::RepoHandling,
            ActionHandler::Issues(_) => ActionKind::IssueHandling,
        }
    }

    /// Name of the client the handler acts through.
    pub fn client_name(&self) -> &str {
        match self {
            ActionHandler::Workflow(action) => action.client().name(),
            ActionHandler::Repo(action) => action.client().name(),
            ActionHandler::Issues(action) => action.client().name(),
        }
    }

    /// Whether events of this kind are routed to the handler at all.
    pub fn handles(&self, kind: EventKind) -> bool {
        match self {
            ActionHandler::Workflow(_) | ActionHandler::Repo(_) => kind.is_workflow(),
            ActionHandler::Issues(_) => kind == EventKind::IssueComment,
        }
    }

    pub async fn handle(
        &self,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        match self {
            ActionHandler::Workflow(action) => match event.workflow() {
                Some(workflow) => action.handle(event.kind(), workflow, cancel).await,
                None => Ok(ActionOutcome::Skipped),
            },
            ActionHandler::Repo(action) => match event.workflow() {
                Some(workflow) => action.handle(event.kind(), workflow, cancel).await,
                None => Ok(ActionOutcome::Skipped),
            },
            ActionHandler::Issues(action) => match event {
                WebhookEvent::IssueComment(comment) => action.handle(comment, cancel).await,
                _ => Ok(ActionOutcome::Skipped),
            },
        }
    }
}

impl<C, P> From<WorkflowAction<C>> for ActionHandler<C, P> {
    fn from(action: WorkflowAction<C>) -> Self {
        ActionHandler::Workflow(action)
    }
}

impl<C, P> From<RepoAction<C>> for ActionHandler<C, P> {
    fn from(action: RepoAction<C>) -> Self {
        ActionHandler::Repo(action)
    }
}

impl<C, P> From<IssuesAction<C, P>> for ActionHandler<C, P> {
    fn from(action: IssuesAction<C, P>) -> Self {
        ActionHandler::Issues(action)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clients::ClientRegistry;
    use crate::config::ActionSpec;
    use crate::test_utils::{MockClient, MockPusher};

    fn handler(kind: &str, args: &str) -> ActionHandler<MockClient, MockPusher> {
        let registry = ClientRegistry::from_clients([
            MockClient::new("acme-app", "acme").with_repository("svc")
        ]);
        let spec: ActionSpec = serde_yaml::from_str(&format!(
            "type: {kind}\nclient: acme-app\nargs:\n{args}"
        ))
        .unwrap();
        build_action(&spec, &registry, &Arc::new(MockPusher::new())).unwrap()
    }

    #[test]
    fn workflow_handlers_only_take_workflow_events() {
        let handler = handler(
            "workflow-handling",
            "  organization: acme\n  repository: svc\n  files-path: [p]\n  issue-assignees: []\n",
        );

        assert_eq!(handler.kind(), ActionKind::WorkflowHandling);
        assert!(handler.handles(EventKind::WorkflowRun));
        assert!(handler.handles(EventKind::WorkflowDispatch));
        assert!(handler.handles(EventKind::WorkflowJob));
        assert!(!handler.handles(EventKind::IssueComment));
    }

    #[test]
    fn issue_handlers_only_take_comments() {
        let handler = handler("issue-handling", "  repos: [svc]\n");

        assert_eq!(handler.kind(), ActionKind::IssueHandling);
        assert_eq!(handler.client_name(), "acme-app");
        assert!(handler.handles(EventKind::IssueComment));
        assert!(!handler.handles(EventKind::WorkflowRun));
    }
}
