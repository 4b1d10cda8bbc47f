//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab interpreter in `crate::github` executes them; tests execute
//! them against a recording mock.

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, IssueNumber, WorkflowRef};

/// GitHub reaction types used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// +1 / thumbs up
    ThumbsUp,
    /// Eyes
    Eyes,
    /// Rocket
    Rocket,
}

impl Reaction {
    /// Returns the GitHub API content string for this reaction.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "+1",
            Reaction::Eyes => "eyes",
            Reaction::Rocket => "rocket",
        }
    }
}

/// A GitHub API effect.
///
/// Effects are repo-scoped: the interpreter is constructed for one
/// repository, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Contents ─────────────────────────────────────────────────────────────
    /// List the entries of a directory.
    ListContents {
        path: String,
        /// Branch, tag or SHA. `None` means the default branch.
        git_ref: Option<String>,
    },

    /// Fetch the decoded content of a single file.
    GetFile { path: String, git_ref: Option<String> },

    // ─── Actions ──────────────────────────────────────────────────────────────
    /// Look up the run to find which workflow it belongs to.
    GetWorkflowRun { run_id: u64 },

    /// Disable a workflow so it can no longer be triggered.
    DisableWorkflow { workflow: WorkflowRef },

    // ─── Issues ───────────────────────────────────────────────────────────────
    /// Open a new issue.
    CreateIssue {
        title: String,
        body: String,
        assignees: Vec<String>,
        labels: Vec<String>,
    },

    /// Add a reaction to an issue comment.
    AddReaction {
        comment_id: CommentId,
        reaction: Reaction,
    },

    // ─── Pull requests and refs ───────────────────────────────────────────────
    /// Fetch a pull request by number.
    GetPullRequest { number: IssueNumber },

    /// Delete a branch (`refs/heads/<branch>`).
    DeleteBranch { branch: String },
}

impl GitHubEffect {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::ListContents { .. } => "list_contents",
            GitHubEffect::GetFile { .. } => "get_file",
            GitHubEffect::GetWorkflowRun { .. } => "get_workflow_run",
            GitHubEffect::DisableWorkflow { .. } => "disable_workflow",
            GitHubEffect::CreateIssue { .. } => "create_issue",
            GitHubEffect::AddReaction { .. } => "add_reaction",
            GitHubEffect::GetPullRequest { .. } => "get_pull_request",
            GitHubEffect::DeleteBranch { .. } => "delete_branch",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Kind of a directory entry returned by the contents API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl EntryKind {
    /// Maps the API `type` string; unknown kinds are treated as submodules
    /// so they are never downloaded.
    pub fn from_api_str(s: &str) -> Self {
        match s {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            "symlink" => EntryKind::Symlink,
            _ => EntryKind::Submodule,
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentEntry {
    /// File name without directories.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    pub kind: EntryKind,
}

/// Pull request data needed by the fork-build action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestData {
    pub number: IssueNumber,
    /// The head branch name.
    pub head_ref: String,
    /// Whether the head repository is a fork of the base repository.
    pub head_is_fork: bool,
    /// Clone URL of the head repository, if GitHub still knows it.
    pub head_clone_url: Option<String>,
}

/// Response from a GitHub API effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Directory entries.
    Contents(Vec<ContentEntry>),

    /// Decoded file content.
    File(String),

    /// Workflow id the run belongs to.
    WorkflowRun { workflow_id: u64 },

    /// Workflow disabled.
    WorkflowDisabled,

    /// Issue created.
    IssueCreated { number: IssueNumber },

    /// Reaction added.
    ReactionAdded,

    /// Pull request data.
    PullRequest(PullRequestData),

    /// Branch deleted.
    BranchDeleted,
}

impl GitHubResponse {
    /// Name of the variant, for "unexpected response" errors.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubResponse::Contents(_) => "contents",
            GitHubResponse::File(_) => "file",
            GitHubResponse::WorkflowRun { .. } => "workflow_run",
            GitHubResponse::WorkflowDisabled => "workflow_disabled",
            GitHubResponse::IssueCreated { .. } => "issue_created",
            GitHubResponse::ReactionAdded => "reaction_added",
            GitHubResponse::PullRequest(_) => "pull_request",
            GitHubResponse::BranchDeleted => "branch_deleted",
        }
    }
}
