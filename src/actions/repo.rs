//! `repo-handling` action.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::enforcer::PolicyEnforcer;
use super::{ActionError, ActionOutcome};
use crate::clients::AppClient;
use crate::config::ConfigError;
use crate::webhooks::{EventKind, WorkflowEvent};

/// Enforces the policy on workflow events of the repository its client is
/// bound to.
pub struct RepoAction<C> {
    client: Arc<C>,
    enforcer: PolicyEnforcer,
}

impl<C: AppClient> RepoAction<C> {
    /// Fails unless the client is bound to a repository.
    pub fn new(client: Arc<C>, enforcer: PolicyEnforcer) -> Result<Self, ConfigError> {
        if client.repository().is_none() {
            return Err(ConfigError::Invalid {
                field: "repository",
                reason: format!(
                    "repo-handling action needs client {} to be bound to a repository",
                    client.name()
                ),
            });
        }
        Ok(Self { client, enforcer })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn enforcer(&self) -> &PolicyEnforcer {
        &self.enforcer
    }

    fn matches(&self, event: &WorkflowEvent) -> bool {
        let organization = self.client.organization();
        let repository = self.client.repository().unwrap_or_default();
        let matches = event.repo.owner == organization && event.repo.repo == repository;
        if !matches {
            debug!(
                expected = %format_args!("{organization}/{repository}"),
                actual = %event.repo,
                "Repository does not match client binding"
            );
        }
        matches
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
