//! Declarative action specifications and their typed arguments.

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::ConfigError;

/// The kinds of action a webhook can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Validate the triggering repository on workflow events for a statically
    /// configured organization/repository, remediating on failure.
    WorkflowHandling,
    /// Same as workflow handling, bound to the client's own repository.
    RepoHandling,
    /// Maintainer comment commands on pull requests (fork builds).
    IssueHandling,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::WorkflowHandling => "workflow-handling",
            ActionKind::RepoHandling => "repo-handling",
            ActionKind::IssueHandling => "issue-handling",
        };
        f.write_str(s)
    }
}

/// One configured action: which kind, which client it acts through, and its
/// kind-specific arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub client: String,
    #[serde(default = "empty_args")]
    pub args: serde_yaml::Value,
}

fn empty_args() -> serde_yaml::Value {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
}

impl ActionSpec {
    /// Decodes `args` into the typed argument struct of this action.
    ///
    /// Missing, mistyped and unknown fields are all rejected.
    pub fn decode_args<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_yaml::from_value(self.args.clone()).map_err(|source| ConfigError::InvalidArgs {
            kind: self.kind,
            client: self.client.clone(),
            source,
        })
    }
}

/// Arguments of a `workflow-handling` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct WorkflowActionArgs {
    /// Only events from this organization are handled.
    pub organization: String,
    /// Only events from this repository (name without owner) are handled.
    pub repository: String,
    /// Optional workflow name filter. Run and job events are matched on the
    /// workflow's display name; dispatch events, which only carry the file,
    /// on the file name with or without its `.yml`/`.yaml` extension.
    #[serde(default)]
    pub workflow: Option<String>,
    /// Directories searched for policy files.
    pub files_path: Vec<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    pub issue_assignees: Vec<String>,
    /// Branch, tag or SHA the policy is read from; default branch if unset.
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub policy_base_url: Option<String>,
    #[serde(default)]
    pub validation_timeout_secs: Option<u64>,
}

/// Arguments of a `repo-handling` action. The organization/repository
/// binding comes from the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RepoActionArgs {
    pub files_path: Vec<String>,
    #[serde(default)]
    pub workers: Option<usize>,
    pub issue_assignees: Vec<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub policy_base_url: Option<String>,
    #[serde(default)]
    pub validation_timeout_secs: Option<u64>,
}

/// Arguments of an `issue-handling` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct IssuesActionArgs {
    /// Repository names (without owner) whose comments are handled.
    pub repos: Vec<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub allowed_associations: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: ActionKind, args: &str) -> ActionSpec {
        ActionSpec {
            kind,
            client: "acme-app".to_string(),
            args: serde_yaml::from_str(args).unwrap(),
        }
    }

    #[test]
    fn decodes_workflow_args() {
        let spec = spec(
            ActionKind::WorkflowHandling,
            r#"
organization: acme
repository: svc
workflow: build
files-path: [".github/policy", "policy"]
workers: 2
issue-assignees: [octocat]
ref: main
"#,
        );

        let args: WorkflowActionArgs = spec.decode_args().unwrap();
        assert_eq!(args.organization, "acme");
        assert_eq!(args.workflow.as_deref(), Some("build"));
        assert_eq!(args.files_path.len(), 2);
        assert_eq!(args.workers, Some(2));
        assert_eq!(args.git_ref.as_deref(), Some("main"));
        assert_eq!(args.policy_base_url, None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let spec = spec(
            ActionKind::WorkflowHandling,
            "organization: acme\nrepository: svc\nissue-assignees: []\n",
        );
        let result: Result<WorkflowActionArgs, _> = spec.decode_args();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidArgs {
                kind: ActionKind::WorkflowHandling,
                ..
            })
        ));
    }

    #[test]
    fn mistyped_field_is_rejected() {
        let spec = spec(
            ActionKind::RepoHandling,
            "files-path: [a]\nworkers: many\nissue-assignees: []\n",
        );
        let result: Result<RepoActionArgs, _> = spec.decode_args();
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let spec = spec(ActionKind::IssueHandling, "repos: [svc]\nlabels: [x]\n");
        let result: Result<IssuesActionArgs, _> = spec.decode_args();
        assert!(result.is_err());
    }

    #[test]
    fn absent_args_decode_as_empty_mapping() {
        let spec: ActionSpec =
            serde_yaml::from_str("type: issue-handling\nclient: acme-app\n").unwrap();
        let result: Result<IssuesActionArgs, _> = spec.decode_args();
        // `repos` is required
        assert!(result.is_err());
    }

    #[test]
    fn action_kind_display_matches_config_spelling() {
        assert_eq!(ActionKind::WorkflowHandling.to_string(), "workflow-handling");
        assert_eq!(ActionKind::RepoHandling.to_string(), "repo-handling");
        assert_eq!(ActionKind::IssueHandling.to_string(), "issue-handling");
    }
}
