//! `issue-handling` action: the fork-build comment command.
//!
//! Pull requests opened from forks run their workflows without the target
//! repository's secrets. A maintainer comments the build command on such a
//! pull request to have the fork head pushed to a `fork-build/<head>` branch
//! of the target repository, where workflows run with full access.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{ActionError, ActionOutcome};
use crate::clients::AppClient;
use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, PullRequestData, Reaction};
use crate::git::{ForkPush, ForkPusher};
use crate::github::GitHubApiError;
use crate::types::IssueNumber;
use crate::webhooks::IssueCommentEvent;

/// Comment that triggers a fork build.
pub const DEFAULT_COMMAND: &str = "/build-fork";

/// Author associations allowed to trigger a fork build.
pub const DEFAULT_ALLOWED_ASSOCIATIONS: [&str; 3] = ["OWNER", "MEMBER", "COLLABORATOR"];

/// Handles maintainer commands on pull requests of the target repositories.
pub struct IssuesAction<C, P> {
    client: Arc<C>,
    pusher: Arc<P>,
    /// Repository names, without owner.
    repos: Vec<String>,
    command: String,
    allowed_associations: Vec<String>,
}

impl<C: AppClient, P: ForkPusher> IssuesAction<C, P> {
    pub fn new(
        client: Arc<C>,
        pusher: Arc<P>,
        repos: Vec<String>,
        command: Option<String>,
        allowed_associations: Option<Vec<String>>,
    ) -> Self {
        Self {
            client,
            pusher,
            repos,
            command: command.unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
            allowed_associations: allowed_associations.unwrap_or_else(|| {
                DEFAULT_ALLOWED_ASSOCIATIONS
                    .iter()
                    .map(|a| a.to_string())
                    .collect()
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Checks every gate that needs no API call.
    fn accepts(&self, event: &IssueCommentEvent) -> bool {
        if event.repo.owner != self.client.organization()
            || !self.repos.iter().any(|r| *r == event.repo.repo)
        {
            debug!(repo = %event.repo, "Not a target repository");
            return false;
        }
        if !self
            .allowed_associations
            .iter()
            .any(|a| a.eq_ignore_ascii_case(&event.author_association))
        {
            debug!(
                repo = %event.repo,
                association = %event.author_association,
                "Comment author is not allowed"
            );
            return false;
        }
        if event.body.trim() != self.command {
            debug!(repo = %event.repo, "Comment is not a command");
            return false;
        }
        true
    }

    #[instrument(skip_all, fields(repo = %event.repo, comment = %event.comment_id))]
    pub async fn handle(
        &self,
        event: &IssueCommentEvent,
        cancel: &CancellationToken,
    ) -> Result<ActionOutcome, ActionError> {
        if !self.accepts(event) {
            return Ok(ActionOutcome::Skipped);
        }
        let Some(number) = event.pr_number else {
            debug!("Comment is not on a pull request");
            return Ok(ActionOutcome::Skipped);
        };

        let api = self.client.api(event.repo.clone());
        let pr = fetch_pull_request(&api, number).await?;
        if !pr.head_is_fork {
            debug!(pr = %number, "Pull request is not from a fork");
            return Ok(ActionOutcome::Skipped);
        }

        let source_url = pr
            .head_clone_url
            .ok_or(ActionError::MissingCloneUrl("head"))?;
        let target_url = event
            .clone_url
            .clone()
            .ok_or(ActionError::MissingCloneUrl("target"))?;
        let token = self.client.installation_token().await?;

        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let request = ForkPush::fork_build(source_url, pr.head_ref, target_url);
        let branch = request.target_branch.clone();
        self.pusher.push(request, token).await?;
        info!(pr = %number, branch = %branch, "Triggered fork build");

        run_effect(
            &api,
            GitHubEffect::AddReaction {
                comment_id: event.comment_id,
                reaction: Reaction::Rocket,
            },
        )
        .await?;
        run_effect(
            &api,
            GitHubEffect::DeleteBranch {
                branch: branch.clone(),
            },
        )
        .await?;

        Ok(ActionOutcome::ForkBuildTriggered { branch })
    }
}

async fn fetch_pull_request<G>(
    api: &G,
    number: IssueNumber,
) -> Result<PullRequestData, ActionError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    match run_effect(api, GitHubEffect::GetPullRequest { number }).await? {
        GitHubResponse::PullRequest(pr) => Ok(pr),
        other => Err(ActionError::UnexpectedResponse {
            effect: "get_pull_request",
            response: other.name(),
        }),
    }
}

/// Executes an effect, tagging failures with the effect name.
async fn run_effect<G>(api: &G, effect: GitHubEffect) -> Result<GitHubResponse, ActionError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let name = effect.name();
    api.interpret(effect)
        .await
        .map_err(|source| ActionError::GitHub {
            effect: name,
            source,
        })
}
