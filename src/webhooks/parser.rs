//! GitHub webhook payload parser.
//!
//! Parses raw webhook JSON into typed [`WebhookEvent`] values.
//!
//! # Parsing Strategy
//!
//! 1. The event type is determined from the `X-GitHub-Event` header
//! 2. The payload is parsed according to the event type
//! 3. Unknown event types and uninteresting actions return `Ok(None)`
//! 4. Malformed payloads return `Err` with details

use serde::Deserialize;
use thiserror::Error;

use crate::types::{CommentId, IssueNumber, RepoId, WorkflowRef};

use super::events::{IssueCommentEvent, WebhookEvent, WorkflowEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` - an event the controller acts on
/// * `Ok(None)` - unknown event type or an action that is ignored
/// * `Err(e)` - malformed payload or missing required fields
///
/// # Examples
///
/// ```
/// use actions_controller::webhooks::parse_webhook;
///
/// let payload = br#"{
///     "action": "requested",
///     "workflow_run": { "id": 30, "name": "build", "workflow_id": 7 },
///     "repository": { "owner": { "login": "acme" }, "name": "svc" },
///     "sender": { "login": "octocat" }
/// }"#;
///
/// let event = parse_webhook("workflow_run", payload).unwrap();
/// assert!(event.is_some());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    match event_type {
        "workflow_dispatch" => {
            parse_workflow_dispatch(payload).map(|e| Some(WebhookEvent::WorkflowDispatch(e)))
        }
        "workflow_run" => parse_workflow_run(payload).map(|e| e.map(WebhookEvent::WorkflowRun)),
        "workflow_job" => parse_workflow_job(payload).map(|e| e.map(WebhookEvent::WorkflowJob)),
        "issue_comment" => {
            parse_issue_comment(payload).map(|e| e.map(WebhookEvent::IssueComment))
        }
        _ => Ok(None),
    }
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's webhook JSON structure, keeping only the fields used.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    owner: RawAccount,
    name: String,
    clone_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    login: String,
}

impl RawRepository {
    /// The event's repository. Organization payloads carry the organization
    /// separately; it is the same account as the repository owner.
    fn into_repo_id(self, organization: Option<RawAccount>) -> RepoId {
        let owner = organization.map(|o| o.login).unwrap_or(self.owner.login);
        RepoId::new(owner, self.name)
    }
}

// ============================================================================
// workflow_dispatch event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWorkflowDispatchPayload {
    /// Path of the workflow file, e.g. `.github/workflows/build.yml`.
    workflow: String,
    repository: RawRepository,
    organization: Option<RawAccount>,
    sender: RawAccount,
}

fn parse_workflow_dispatch(payload: &[u8]) -> Result<WorkflowEvent, ParseError> {
    let raw: RawWorkflowDispatchPayload = serde_json::from_slice(payload)?;

    let workflow = WorkflowRef::from_path(&raw.workflow);
    let workflow_name = workflow.to_string();

    Ok(WorkflowEvent {
        repo: raw.repository.into_repo_id(raw.organization),
        sender: raw.sender.login,
        workflow,
        workflow_name,
    })
}

// ============================================================================
// workflow_run event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWorkflowRunPayload {
    action: String,
    workflow_run: RawWorkflowRun,
    repository: RawRepository,
    organization: Option<RawAccount>,
    sender: RawAccount,
}

#[derive(Debug, Deserialize)]
struct RawWorkflowRun {
    name: Option<String>,
    workflow_id: u64,
}

fn parse_workflow_run(payload: &[u8]) -> Result<Option<WorkflowEvent>, ParseError> {
    let raw: RawWorkflowRunPayload = serde_json::from_slice(payload)?;

    // `in_progress` and `completed` follow every `requested`
    if raw.action != "requested" {
        return Ok(None);
    }

    let workflow = WorkflowRef::Id(raw.workflow_run.workflow_id);
    let workflow_name = raw
        .workflow_run
        .name
        .unwrap_or_else(|| workflow.to_string());

    Ok(Some(WorkflowEvent {
        repo: raw.repository.into_repo_id(raw.organization),
        sender: raw.sender.login,
        workflow,
        workflow_name,
    }))
}

// ============================================================================
// workflow_job event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawWorkflowJobPayload {
    action: String,
    workflow_job: RawWorkflowJob,
    repository: RawRepository,
    organization: Option<RawAccount>,
    sender: RawAccount,
}

#[derive(Debug, Deserialize)]
struct RawWorkflowJob {
    run_id: u64,
    name: String,
    workflow_name: Option<String>,
}

fn parse_workflow_job(payload: &[u8]) -> Result<Option<WorkflowEvent>, ParseError> {
    let raw: RawWorkflowJobPayload = serde_json::from_slice(payload)?;

    if raw.action != "queued" {
        return Ok(None);
    }

    Ok(Some(WorkflowEvent {
        repo: raw.repository.into_repo_id(raw.organization),
        sender: raw.sender.login,
        workflow: WorkflowRef::Run(raw.workflow_job.run_id),
        workflow_name: raw.workflow_job.workflow_name.unwrap_or(raw.workflow_job.name),
    }))
}

// ============================================================================
// issue_comment event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
    organization: Option<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    body: Option<String>,
    user: RawAccount,
    author_association: String,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    // If this field is present, the issue is actually a PR
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<Option<IssueCommentEvent>, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    // Edits and deletions never carry a new command
    if raw.action != "created" {
        return Ok(None);
    }

    let pr_number = raw.issue.pull_request.map(|_| IssueNumber(raw.issue.number));
    let clone_url = raw.repository.clone_url.clone();

    Ok(Some(IssueCommentEvent {
        repo: raw.repository.into_repo_id(raw.organization),
        clone_url,
        pr_number,
        comment_id: CommentId(raw.comment.id),
        body: raw.comment.body.unwrap_or_default(),
        author_association: raw.comment.author_association,
        author_login: raw.comment.user.login,
    }))
}
