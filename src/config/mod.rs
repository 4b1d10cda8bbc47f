//! Configuration file model.
//!
//! The configuration is a YAML document with two lists:
//!
//! ```yaml
//! clients:
//!   - name: acme-app
//!     organization: acme
//!     github:
//!       app-id: 1234
//!       key-path: /etc/actions-controller/acme.pem
//!     server-info:
//!       base-url: https://github.example.com/api/v3
//! webhooks:
//!   - serve-path: /github
//!     secret: ACME_WEBHOOK_SECRET
//!     actions:
//!       - type: workflow-handling
//!         client: acme-app
//!         args:
//!           organization: acme
//!           repository: svc
//!           files-path: [".github/policy"]
//!           issue-assignees: [octocat]
//! ```
//!
//! Action `args` stay untyped here; the action factory decodes them into the
//! argument struct of the action kind (see [`actions`]).

pub mod actions;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use actions::{ActionKind, ActionSpec, IssuesActionArgs, RepoActionArgs, WorkflowActionArgs};

/// Default bound on one event dispatch.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(240);

/// Errors raised while loading or interpreting configuration.
///
/// All of these are fatal at startup: the controller never runs partially
/// configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("webhook action client not found: {0}")]
    ClientNotFound(String),

    #[error("github auth config missing for client {0}")]
    MissingClientConfig(String),

    #[error("invalid args for {kind} action using client {client}: {source}")]
    InvalidArgs {
        kind: ActionKind,
        client: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("webhook secret environment variable {0} is not set")]
    MissingSecret(String),

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

impl Configuration {
    /// Parses a configuration document.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_yaml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source)
    }

    /// Structural checks that serde cannot express.
    fn check(&self) -> Result<(), ConfigError> {
        let mut names = std::collections::HashSet::new();
        for client in &self.clients {
            if !names.insert(client.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "client",
                    name: client.name.clone(),
                });
            }
        }

        let mut paths = std::collections::HashSet::new();
        for webhook in &self.webhooks {
            check_serve_path(&webhook.serve_path)?;
            if !paths.insert(webhook.serve_path.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "serve-path",
                    name: webhook.serve_path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Paths served by the controller itself.
const RESERVED_PATHS: &[&str] = &["/health", "/version"];

/// Rejects serve paths the router cannot register.
fn check_serve_path(path: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        field: "serve-path",
        reason,
    };

    if !path.starts_with('/') {
        return Err(invalid(format!("{path} must start with '/'")));
    }
    if RESERVED_PATHS.contains(&path.trim_end_matches('/')) {
        return Err(invalid(format!("{path} is reserved")));
    }
    if path.contains(['{', '}', ':', '*']) {
        return Err(invalid(format!("{path} must be a literal path")));
    }
    Ok(())
}

/// A named GitHub App installation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Name used by actions to reference this client.
    pub name: String,
    /// Organization the app installation belongs to.
    pub organization: String,
    /// Repository the client is bound to, for repository-scoped actions.
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub github: Option<GitHubAuthConfig>,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

/// GitHub App credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GitHubAuthConfig {
    pub app_id: u64,
    /// Path to the app's PEM private key.
    pub key_path: PathBuf,
}

/// GitHub Enterprise server location.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ServerInfo {
    pub base_url: String,
}

/// A webhook endpoint and the actions run for its events.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct WebhookConfig {
    pub serve_path: String,
    /// Name of the environment variable holding the webhook secret.
    pub secret: String,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WebhookConfig {
    /// Reads the webhook secret from the environment.
    pub fn resolve_secret(&self) -> Result<Vec<u8>, ConfigError> {
        match std::env::var(&self.secret) {
            Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
            _ => Err(ConfigError::MissingSecret(self.secret.clone())),
        }
    }

    /// Deadline for one event dispatch.
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
clients:
  - name: acme-app
    organization: acme
    repository: svc
    github:
      app-id: 1234
      key-path: /keys/acme.pem
    server-info:
      base-url: https://github.example.com/api/v3
webhooks:
  - serve-path: /github
    secret: ACME_SECRET
    timeout-secs: 120
    actions:
      - type: workflow-handling
        client: acme-app
        args:
          organization: acme
          repository: svc
          files-path: [".github/policy"]
          issue-assignees: [octocat]
      - type: issue-handling
        client: acme-app
        args:
          repos: [svc]
"#;

    #[test]
    fn parses_sample_config() {
        let config = Configuration::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.clients.len(), 1);
        let client = &config.clients[0];
        assert_eq!(client.name, "acme-app");
        assert_eq!(client.repository.as_deref(), Some("svc"));
        assert_eq!(client.github.as_ref().unwrap().app_id, 1234);
        assert_eq!(
            client.server_info.as_ref().unwrap().base_url,
            "https://github.example.com/api/v3"
        );

        let webhook = &config.webhooks[0];
        assert_eq!(webhook.serve_path, "/github");
        assert_eq!(webhook.timeout(), Duration::from_secs(120));
        assert_eq!(webhook.actions.len(), 2);
        assert_eq!(webhook.actions[0].kind, ActionKind::WorkflowHandling);
        assert_eq!(webhook.actions[1].kind, ActionKind::IssueHandling);
    }

    #[test]
    fn default_timeout_applies() {
        let config = Configuration::from_yaml(
            "webhooks:\n  - serve-path: /hook\n    secret: S\n",
        )
        .unwrap();
        assert_eq!(config.webhooks[0].timeout(), DEFAULT_WEBHOOK_TIMEOUT);
        assert!(config.webhooks[0].actions.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = Configuration::from_yaml("clients: []\nextra: 1\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_unknown_action_type() {
        let result = Configuration::from_yaml(
            "webhooks:\n  - serve-path: /hook\n    secret: S\n    actions:\n      - type: deploy-handling\n        client: c\n",
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_duplicate_client_names() {
        let result = Configuration::from_yaml(
            "clients:\n  - name: a\n    organization: x\n  - name: a\n    organization: y\n",
        );
        assert!(matches!(
            result,
            Err(ConfigError::Duplicate { kind: "client", .. })
        ));
    }

    #[test]
    fn rejects_relative_serve_path() {
        let result = Configuration::from_yaml("webhooks:\n  - serve-path: hook\n    secret: S\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "serve-path",
                ..
            })
        ));
    }

    #[test]
    fn rejects_reserved_and_parameterised_serve_paths() {
        for path in ["/health", "/version/", "/hooks/{org}", "/hooks/*rest", "/hooks/:org"] {
            let yaml = format!("webhooks:\n  - serve-path: \"{path}\"\n    secret: S\n");
            let result = Configuration::from_yaml(&yaml);
            assert!(
                matches!(
                    result,
                    Err(ConfigError::Invalid {
                        field: "serve-path",
                        ..
                    })
                ),
                "{path}: {result:?}"
            );
        }
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Configuration::load(file.path()).unwrap();
        assert_eq!(config.webhooks.len(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Configuration::load(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn resolve_secret_missing_env() {
        let webhook = WebhookConfig {
            serve_path: "/hook".to_string(),
            secret: "ACTIONS_CONTROLLER_TEST_SECRET_THAT_IS_NEVER_SET".to_string(),
            actions: vec![],
            timeout_secs: None,
        };
        assert!(matches!(
            webhook.resolve_secret(),
            Err(ConfigError::MissingSecret(_))
        ));
    }
}
