//! GitHub effect interpreter using octocrab.
//!
//! Key implementation details:
//! - Contents are listed and fetched through the contents API; file content
//!   arrives base64-encoded and is decoded by octocrab
//! - Workflow disable and branch deletion answer `204 No Content`, so they go
//!   through octocrab's raw request methods and the status is checked here
//! - Errors are categorized (transient vs permanent) but never retried

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{
    ContentEntry, EntryKind, GitHubEffect, GitHubInterpreter, GitHubResponse, PullRequestData,
    Reaction,
};
use crate::types::{CommentId, IssueNumber, WorkflowRef};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    debug!(repo = %client.repo(), effect = effect.name(), "Executing GitHub effect");

    match effect {
        GitHubEffect::ListContents { path, git_ref } => {
            list_contents(client, &path, git_ref.as_deref()).await
        }
        GitHubEffect::GetFile { path, git_ref } => {
            get_file(client, &path, git_ref.as_deref()).await
        }
        GitHubEffect::GetWorkflowRun { run_id } => get_workflow_run(client, run_id).await,
        GitHubEffect::DisableWorkflow { workflow } => disable_workflow(client, &workflow).await,
        GitHubEffect::CreateIssue {
            title,
            body,
            assignees,
            labels,
        } => create_issue(client, title, body, assignees, labels).await,
        GitHubEffect::AddReaction {
            comment_id,
            reaction,
        } => add_reaction(client, comment_id, reaction).await,
        GitHubEffect::GetPullRequest { number } => get_pull_request(client, number).await,
        GitHubEffect::DeleteBranch { branch } => delete_branch(client, &branch).await,
    }
}

// ─── Contents ─────────────────────────────────────────────────────────────────

async fn list_contents(
    client: &OctocrabClient,
    path: &str,
    git_ref: Option<&str>,
) -> Result<GitHubResponse, GitHubApiError> {
    let repos = client.inner().repos(client.owner(), client.repo_name());
    let mut request = repos.get_content().path(path);
    if let Some(git_ref) = git_ref {
        request = request.r#ref(git_ref);
    }

    let items = request.send().await.map_err(GitHubApiError::from_octocrab)?;

    let entries = items
        .items
        .into_iter()
        .map(|item| ContentEntry {
            kind: EntryKind::from_api_str(&item.r#type),
            name: item.name,
            path: item.path,
        })
        .collect();

    Ok(GitHubResponse::Contents(entries))
}

async fn get_file(
    client: &OctocrabClient,
    path: &str,
    git_ref: Option<&str>,
) -> Result<GitHubResponse, GitHubApiError> {
    let repos = client.inner().repos(client.owner(), client.repo_name());
    let mut request = repos.get_content().path(path);
    if let Some(git_ref) = git_ref {
        request = request.r#ref(git_ref);
    }

    let items = request.send().await.map_err(GitHubApiError::from_octocrab)?;

    let item = items
        .items
        .into_iter()
        .find(|item| item.path == path && item.r#type == "file")
        .ok_or_else(|| {
            GitHubApiError::permanent_without_source(format!("{} is not a regular file", path))
        })?;

    let content = item.decoded_content().ok_or_else(|| {
        GitHubApiError::permanent_without_source(format!("{} has no decodable content", path))
    })?;

    Ok(GitHubResponse::File(content))
}

// ─── Actions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WorkflowRunResponse {
    workflow_id: u64,
}

async fn get_workflow_run(
    client: &OctocrabClient,
    run_id: u64,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/actions/runs/{}",
        client.owner(),
        client.repo_name(),
        run_id
    );

    let run: WorkflowRunResponse = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::WorkflowRun {
        workflow_id: run.workflow_id,
    })
}

async fn disable_workflow(
    client: &OctocrabClient,
    workflow: &WorkflowRef,
) -> Result<GitHubResponse, GitHubApiError> {
    let workflow_id = match workflow {
        WorkflowRef::Id(id) => id.to_string(),
        WorkflowRef::File(file) => file.clone(),
        WorkflowRef::Run(run_id) => {
            return Err(GitHubApiError::permanent_without_source(format!(
                "workflow for run {} must be resolved before disabling",
                run_id
            )));
        }
    };

    let url = format!(
        "/repos/{}/{}/actions/workflows/{}/disable",
        client.owner(),
        client.repo_name(),
        workflow_id
    );

    let response = client
        .inner()
        ._put(url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let status = response.status();
    if status.is_success() {
        Ok(GitHubResponse::WorkflowDisabled)
    } else {
        Err(GitHubApiError::from_status(
            status.as_u16(),
            format!("disabling workflow {} was rejected", workflow_id),
        ))
    }
}

// ─── Issues ───────────────────────────────────────────────────────────────────

async fn create_issue(
    client: &OctocrabClient,
    title: String,
    body: String,
    assignees: Vec<String>,
    labels: Vec<String>,
) -> Result<GitHubResponse, GitHubApiError> {
    let issue = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create(title)
        .body(body)
        .assignees(assignees)
        .labels(labels)
        .send()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::IssueCreated {
        number: IssueNumber(issue.number),
    })
}

async fn add_reaction(
    client: &OctocrabClient,
    comment_id: CommentId,
    reaction: Reaction,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/issues/comments/{}/reactions",
        client.owner(),
        client.repo_name(),
        comment_id.0
    );

    #[derive(Serialize)]
    struct ReactionRequest {
        content: &'static str,
    }

    let result: Result<serde_json::Value, _> = client
        .inner()
        .post(
            &url,
            Some(&ReactionRequest {
                content: reaction.as_api_str(),
            }),
        )
        .await;

    match result {
        Ok(_) => Ok(GitHubResponse::ReactionAdded),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Pull requests and refs ───────────────────────────────────────────────────

async fn get_pull_request(
    client: &OctocrabClient,
    number: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(client.owner(), client.repo_name())
        .get(number.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let head_repo = pull.head.repo.as_ref();

    Ok(GitHubResponse::PullRequest(PullRequestData {
        number,
        head_ref: pull.head.ref_field.clone(),
        head_is_fork: head_repo.and_then(|r| r.fork).unwrap_or(false),
        head_clone_url: head_repo
            .and_then(|r| r.clone_url.as_ref())
            .map(|url| url.to_string()),
    }))
}

async fn delete_branch(
    client: &OctocrabClient,
    branch: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/git/refs/heads/{}",
        client.owner(),
        client.repo_name(),
        branch
    );

    let response = client
        .inner()
        ._delete(url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let status = response.status();
    if status.is_success() {
        Ok(GitHubResponse::BranchDeleted)
    } else {
        Err(GitHubApiError::from_status(
            status.as_u16(),
            format!("deleting branch {} was rejected", branch),
        ))
    }
}
