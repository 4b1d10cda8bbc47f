//! Action Factory: builds handlers from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::enforcer::PolicyEnforcer;
use super::{ActionHandler, IssuesAction, RepoAction, WorkflowAction};
use crate::clients::{AppClient, ClientRegistry};
use crate::config::{
    ActionKind, ActionSpec, ConfigError, IssuesActionArgs, RepoActionArgs, WorkflowActionArgs,
};
use crate::git::ForkPusher;
use crate::policy::DEFAULT_POLICY_BASE_URL;
use crate::validator::{DEFAULT_VALIDATION_TIMEOUT, ValidatorSettings};

/// Builds one handler.
///
/// Fails if the client is not registered, if the arguments do not decode
/// into the kind's argument struct, or if a `repo-handling` client has no
/// repository binding.
pub fn build_action<C, P>(
    spec: &ActionSpec,
    registry: &ClientRegistry<C>,
    pusher: &Arc<P>,
) -> Result<ActionHandler<C, P>, ConfigError>
where
    C: AppClient,
    P: ForkPusher,
{
    let client = registry.require(&spec.client)?;

    let handler: ActionHandler<C, P> = match spec.kind {
        ActionKind::WorkflowHandling => {
            let args: WorkflowActionArgs = spec.decode_args()?;
            let enforcer = enforcer(PolicyArgs {
                files_path: args.files_path,
                workers: args.workers,
                git_ref: args.git_ref,
                policy_base_url: args.policy_base_url,
                validation_timeout_secs: args.validation_timeout_secs,
                issue_assignees: args.issue_assignees,
            });
            WorkflowAction::new(
                client,
                args.organization,
                args.repository,
                args.workflow,
                enforcer,
            )
            .into()
        }
        ActionKind::RepoHandling => {
            let args: RepoActionArgs = spec.decode_args()?;
            let enforcer = enforcer(PolicyArgs {
                files_path: args.files_path,
                workers: args.workers,
                git_ref: args.git_ref,
                policy_base_url: args.policy_base_url,
                validation_timeout_secs: args.validation_timeout_secs,
                issue_assignees: args.issue_assignees,
            });
            RepoAction::new(client, enforcer)?.into()
        }
        ActionKind::IssueHandling => {
            let args: IssuesActionArgs = spec.decode_args()?;
            IssuesAction::new(
                client,
                Arc::clone(pusher),
                args.repos,
                args.command,
                args.allowed_associations,
            )
            .into()
        }
    };

    debug!(kind = %spec.kind, client = %spec.client, "Initialized webhook action");
    Ok(handler)
}

/// Builds every handler of a webhook, failing on the first bad spec.
pub fn build_actions<C, P>(
    specs: &[ActionSpec],
    registry: &ClientRegistry<C>,
    pusher: &Arc<P>,
) -> Result<Vec<ActionHandler<C, P>>, ConfigError>
where
    C: AppClient,
    P: ForkPusher,
{
    specs
        .iter()
        .map(|spec| build_action(spec, registry, pusher))
        .collect()
}

/// The arguments shared by the two policy-enforcing kinds.
struct PolicyArgs {
    files_path: Vec<String>,
    workers: Option<usize>,
    git_ref: Option<String>,
    policy_base_url: Option<String>,
    validation_timeout_secs: Option<u64>,
    issue_assignees: Vec<String>,
}

fn enforcer(args: PolicyArgs) -> PolicyEnforcer {
    let settings = ValidatorSettings {
        paths: args.files_path,
        workers: args.workers,
        git_ref: args.git_ref,
        policy_base_url: args
            .policy_base_url
            .unwrap_or_else(|| DEFAULT_POLICY_BASE_URL.to_string()),
        timeout: args
            .validation_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_VALIDATION_TIMEOUT),
    };
    PolicyEnforcer::new(settings, args.issue_assignees)
}
