//! Webhook event types.
//!
//! Only the events the controller acts on are represented:
//!
//! - `workflow_dispatch` - a workflow was triggered manually or through the API
//! - `workflow_run` - a workflow run was requested
//! - `workflow_job` - a job of a workflow run was queued
//! - `issue_comment` - a comment was posted on an issue or pull request

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, IssueNumber, RepoId, WorkflowRef};

/// Which kind of event a [`WebhookEvent`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WorkflowDispatch,
    WorkflowRun,
    WorkflowJob,
    IssueComment,
}

impl EventKind {
    /// The `X-GitHub-Event` header value of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WorkflowDispatch => "workflow_dispatch",
            EventKind::WorkflowRun => "workflow_run",
            EventKind::WorkflowJob => "workflow_job",
            EventKind::IssueComment => "issue_comment",
        }
    }

    /// True for the three workflow event kinds.
    pub fn is_workflow(&self) -> bool {
        !matches!(self, EventKind::IssueComment)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEvent {
    WorkflowDispatch(WorkflowEvent),
    WorkflowRun(WorkflowEvent),
    WorkflowJob(WorkflowEvent),
    IssueComment(IssueCommentEvent),
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebhookEvent::WorkflowDispatch(_) => EventKind::WorkflowDispatch,
            WebhookEvent::WorkflowRun(_) => EventKind::WorkflowRun,
            WebhookEvent::WorkflowJob(_) => EventKind::WorkflowJob,
            WebhookEvent::IssueComment(_) => EventKind::IssueComment,
        }
    }

    /// Repository the event belongs to. The owner is the organization.
    pub fn repo(&self) -> &RepoId {
        match self {
            WebhookEvent::WorkflowDispatch(e)
            | WebhookEvent::WorkflowRun(e)
            | WebhookEvent::WorkflowJob(e) => &e.repo,
            WebhookEvent::IssueComment(e) => &e.repo,
        }
    }

    /// Login of the user who triggered the event.
    pub fn sender(&self) -> &str {
        match self {
            WebhookEvent::WorkflowDispatch(e)
            | WebhookEvent::WorkflowRun(e)
            | WebhookEvent::WorkflowJob(e) => &e.sender,
            WebhookEvent::IssueComment(e) => &e.author_login,
        }
    }

    /// The workflow payload of workflow events.
    pub fn workflow(&self) -> Option<&WorkflowEvent> {
        match self {
            WebhookEvent::WorkflowDispatch(e)
            | WebhookEvent::WorkflowRun(e)
            | WebhookEvent::WorkflowJob(e) => Some(e),
            WebhookEvent::IssueComment(_) => None,
        }
    }
}

/// A workflow dispatch, run or job event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub repo: RepoId,

    /// Login of the user who triggered the workflow.
    pub sender: String,

    /// How the workflow can be addressed in the Actions API.
    ///
    /// Job events only know their run; the workflow id is looked up before
    /// the workflow can be disabled.
    pub workflow: WorkflowRef,

    /// Display name of the workflow (the file name for dispatch events).
    pub workflow_name: String,
}

/// A comment created on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub repo: RepoId,

    /// HTTPS clone URL of the repository.
    pub clone_url: Option<String>,

    /// Set only when the comment is on a pull request.
    pub pr_number: Option<IssueNumber>,

    pub comment_id: CommentId,
    pub body: String,

    /// The author's relationship with the repository, e.g. `MEMBER`.
    pub author_association: String,

    pub author_login: String,
}
