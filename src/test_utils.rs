//! Shared test doubles and fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;

use crate::clients::{AppClient, ClientError};
use crate::effects::{
    ContentEntry, EntryKind, GitHubEffect, GitHubInterpreter, GitHubResponse, PullRequestData,
};
use crate::git::{ForkPush, ForkPusher, GitError, GitResult};
use crate::github::GitHubApiError;
use crate::policy::normalize_path;
use crate::types::{IssueNumber, RepoId};

// ─── Mock GitHub ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    listings: HashMap<String, Vec<ContentEntry>>,
    files: HashMap<String, String>,
    workflow_runs: HashMap<u64, u64>,
    pull_requests: HashMap<u64, PullRequestData>,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    next_issue: u64,
    calls: Vec<(Option<RepoId>, GitHubEffect)>,
}

/// A recording in-memory GitHub.
///
/// Clones share state. [`MockGitHub::scoped`] returns a handle that records
/// the repository it was scoped to, the way a real interpreter is built per
/// repository.
#[derive(Clone, Default)]
pub struct MockGitHub {
    state: Arc<Mutex<MockState>>,
    repo: Option<RepoId>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scoped(&self, repo: RepoId) -> Self {
        Self {
            state: Arc::clone(&self.state),
            repo: Some(repo),
        }
    }

    /// Adds a file, listing it in its parent directory.
    pub fn add_file(&self, path: &str, content: &str) {
        let path = normalize_path(path).to_string();
        let mut state = self.state.lock().unwrap();
        state
            .listings
            .entry(parent_of(&path).to_string())
            .or_default()
            .push(entry(&path, EntryKind::File));
        state.files.insert(path, content.to_string());
    }

    /// Adds an empty directory, listing it in its parent directory.
    pub fn add_dir(&self, path: &str) {
        let path = normalize_path(path).to_string();
        let mut state = self.state.lock().unwrap();
        state
            .listings
            .entry(parent_of(&path).to_string())
            .or_default()
            .push(entry(&path, EntryKind::Dir));
        state.listings.entry(path).or_default();
    }

    pub fn set_workflow_run(&self, run_id: u64, workflow_id: u64) {
        self.state
            .lock()
            .unwrap()
            .workflow_runs
            .insert(run_id, workflow_id);
    }

    pub fn set_pull_request(&self, pr: PullRequestData) {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .insert(pr.number.0, pr);
    }

    /// Makes every effect with this name fail with HTTP 500.
    pub fn fail(&self, effect_name: &'static str) {
        self.state.lock().unwrap().failing.insert(effect_name);
    }

    /// Delays every response.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Every effect executed so far, in order.
    pub fn calls(&self) -> Vec<GitHubEffect> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, effect)| effect.clone())
            .collect()
    }

    /// Every effect executed so far with the repository it was scoped to.
    pub fn scoped_calls(&self) -> Vec<(Option<RepoId>, GitHubEffect)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of effects executed with the given name.
    pub fn count(&self, effect_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, effect)| effect.name() == effect_name)
            .count()
    }

    fn respond(&self, effect: &GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(effect.name()) {
            return Err(GitHubApiError::from_status(
                500,
                format!("{} failed", effect.name()),
            ));
        }

        let not_found = || GitHubApiError::from_status(404, "Not Found");
        match effect {
            GitHubEffect::ListContents { path, .. } => {
                let path = normalize_path(path);
                if let Some(entries) = state.listings.get(path) {
                    Ok(GitHubResponse::Contents(entries.clone()))
                } else if state.files.contains_key(path) {
                    Ok(GitHubResponse::Contents(vec![entry(path, EntryKind::File)]))
                } else {
                    Err(not_found())
                }
            }
            GitHubEffect::GetFile { path, .. } => state
                .files
                .get(normalize_path(path))
                .cloned()
                .map(GitHubResponse::File)
                .ok_or_else(not_found),
            GitHubEffect::GetWorkflowRun { run_id } => state
                .workflow_runs
                .get(run_id)
                .map(|&workflow_id| GitHubResponse::WorkflowRun { workflow_id })
                .ok_or_else(not_found),
            GitHubEffect::DisableWorkflow { .. } => Ok(GitHubResponse::WorkflowDisabled),
            GitHubEffect::CreateIssue { .. } => {
                state.next_issue += 1;
                Ok(GitHubResponse::IssueCreated {
                    number: IssueNumber(state.next_issue),
                })
            }
            GitHubEffect::AddReaction { .. } => Ok(GitHubResponse::ReactionAdded),
            GitHubEffect::GetPullRequest { number } => state
                .pull_requests
                .get(&number.0)
                .cloned()
                .map(GitHubResponse::PullRequest)
                .ok_or_else(not_found),
            GitHubEffect::DeleteBranch { .. } => Ok(GitHubResponse::BranchDeleted),
        }
    }
}

impl GitHubInterpreter for MockGitHub {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((self.repo.clone(), effect.clone()));
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.respond(&effect)
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn entry(path: &str, kind: EntryKind) -> ContentEntry {
    let name = path.rsplit('/').next().unwrap_or(path);
    ContentEntry {
        name: name.to_string(),
        path: path.to_string(),
        kind,
    }
}

// ─── Mock client ──────────────────────────────────────────────────────────────

/// A client whose API is a [`MockGitHub`].
#[derive(Clone)]
pub struct MockClient {
    name: String,
    organization: String,
    repository: Option<String>,
    pub github: MockGitHub,
}

impl MockClient {
    pub fn new(name: &str, organization: &str) -> Self {
        Self {
            name: name.to_string(),
            organization: organization.to_string(),
            repository: None,
            github: MockGitHub::new(),
        }
    }

    pub fn with_repository(mut self, repository: &str) -> Self {
        self.repository = Some(repository.to_string());
        self
    }

    pub fn with_github(mut self, github: MockGitHub) -> Self {
        self.github = github;
        self
    }
}

impl AppClient for MockClient {
    type Api = MockGitHub;

    fn name(&self) -> &str {
        &self.name
    }

    fn organization(&self) -> &str {
        &self.organization
    }

    fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    fn api(&self, repo: RepoId) -> MockGitHub {
        self.github.scoped(repo)
    }

    async fn installation_token(&self) -> Result<SecretString, ClientError> {
        Ok(SecretString::from(format!("token-for-{}", self.organization)))
    }
}

// ─── Mock fork pusher ─────────────────────────────────────────────────────────

/// Records fork pushes instead of running git.
#[derive(Clone, Default)]
pub struct MockPusher {
    pushes: Arc<Mutex<Vec<ForkPush>>>,
    fail: bool,
}

impl MockPusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn pushes(&self) -> Vec<ForkPush> {
        self.pushes.lock().unwrap().clone()
    }
}

impl ForkPusher for MockPusher {
    async fn push(&self, request: ForkPush, _token: SecretString) -> GitResult<()> {
        self.pushes.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(GitError::CommandFailed {
                command: format!("git push {}", request.target_url),
                stderr: "remote rejected".to_string(),
            });
        }
        Ok(())
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

/// A policy file for `org` listing `repos`.
pub fn policy_yaml(org: &str, repos: &[&str]) -> String {
    let repos = repos
        .iter()
        .map(|r| format!("\"{r}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "url: https://octodemo.com/{org}\ncontactEmail: platform@{org}.com\nuseCase: {org}\nrepos: [{repos}]\n"
    )
}

/// A `workflow_run` delivery body for workflow 7 (`build`), run 30.
pub fn workflow_run_payload(org: &str, repo: &str, action: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": action,
        "workflow_run": { "id": 30, "name": "build", "workflow_id": 7 },
        "repository": {
            "owner": { "login": org },
            "name": repo,
            "clone_url": format!("https://github.com/{org}/{repo}.git")
        },
        "organization": { "login": org },
        "sender": { "login": "octocat" }
    }))
    .unwrap()
}

/// An `issue_comment` delivery body for a comment on pull request 42.
pub fn issue_comment_payload(org: &str, repo: &str, body: &str, association: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "created",
        "comment": {
            "id": 12345,
            "body": body,
            "user": { "login": "maintainer" },
            "author_association": association
        },
        "issue": {
            "number": 42,
            "pull_request": { "url": format!("https://api.github.com/repos/{org}/{repo}/pulls/42") }
        },
        "repository": {
            "owner": { "login": org },
            "name": repo,
            "clone_url": format!("https://github.com/{org}/{repo}.git")
        }
    }))
    .unwrap()
}
