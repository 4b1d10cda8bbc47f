//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using a
//! CommentId where an IssueNumber is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses an `owner/repo` string.
    ///
    /// Returns `None` unless both halves are non-empty and there is exactly
    /// one separator.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(RepoId::new(owner, repo))
    }

    /// Returns `owner/repo`.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// How a workflow is addressed when talking to the Actions API.
///
/// Webhooks identify the triggering workflow differently per event kind:
/// `workflow_run` carries the numeric workflow id, `workflow_dispatch` only
/// carries the workflow file path, and `workflow_job` only carries the run
/// id (the workflow id has to be looked up from the run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WorkflowRef {
    /// Numeric workflow id.
    Id(u64),
    /// Workflow file name, e.g. `build.yml`.
    File(String),
    /// The run that executed the workflow.
    Run(u64),
}

impl WorkflowRef {
    /// Builds a reference from a workflow path such as
    /// `.github/workflows/build.yml`; the API accepts the bare file name.
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or(path);
        WorkflowRef::File(file.to_string())
    }

    /// Returns the numeric workflow id, if known without an API lookup.
    pub fn id(&self) -> Option<u64> {
        match self {
            WorkflowRef::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowRef::Id(id) => write!(f, "{}", id),
            WorkflowRef::File(file) => write!(f, "{}", file),
            WorkflowRef::Run(run) => write!(f, "run {}", run),
        }
    }
}

/// A GitHub issue comment ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An issue or pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub u64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for IssueNumber {
    fn from(n: u64) -> Self {
        IssueNumber(n)
    }
}
