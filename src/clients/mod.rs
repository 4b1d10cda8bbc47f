//! Client registry.
//!
//! A client is one GitHub App installation, named in configuration and
//! referenced by actions. The registry is built once at startup and is
//! read-only afterwards, so handlers share it through `Arc` without locking.

mod github;

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::{ClientConfig, ConfigError};
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::RepoId;

pub use github::GitHubAppClient;

/// Errors raised while authenticating a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read private key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid private key {path}: {source}")]
    InvalidKey {
        path: PathBuf,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("GitHub App authentication failed for client {client}: {source}")]
    Auth {
        client: String,
        #[source]
        source: octocrab::Error,
    },
}

/// An authenticated handle on one app installation.
pub trait AppClient: Send + Sync + 'static {
    /// Repository-scoped API interpreter handed out by [`AppClient::api`].
    type Api: GitHubInterpreter<Error = GitHubApiError> + Clone + Send + Sync + 'static;

    /// Name the client is registered under.
    fn name(&self) -> &str;

    /// Organization of the installation.
    fn organization(&self) -> &str;

    /// Repository the client is bound to, if any.
    fn repository(&self) -> Option<&str>;

    /// Returns an API interpreter scoped to `repo`.
    fn api(&self, repo: RepoId) -> Self::Api;

    /// Mints a fresh installation access token, for git operations over HTTPS.
    fn installation_token(&self) -> impl Future<Output = Result<SecretString, ClientError>> + Send;
}

/// Named clients, looked up by actions at construction time.
pub struct ClientRegistry<C> {
    clients: HashMap<String, Arc<C>>,
}

impl<C: AppClient> ClientRegistry<C> {
    /// Builds a registry from already-constructed clients.
    pub fn from_clients(clients: impl IntoIterator<Item = C>) -> Self {
        let clients = clients
            .into_iter()
            .map(|client| (client.name().to_string(), Arc::new(client)))
            .collect();
        Self { clients }
    }

    /// Looks up a client by name.
    pub fn get(&self, name: &str) -> Option<Arc<C>> {
        self.clients.get(name).cloned()
    }

    /// Like [`ClientRegistry::get`], failing with a configuration error.
    pub fn require(&self, name: &str) -> Result<Arc<C>, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::ClientNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl ClientRegistry<GitHubAppClient> {
    /// Authenticates every configured client.
    ///
    /// Any failure aborts startup; no partially populated registry is
    /// returned.
    pub async fn connect(configs: &[ClientConfig]) -> Result<Self, ClientError> {
        let mut clients = Vec::with_capacity(configs.len());
        for config in configs {
            clients.push(GitHubAppClient::connect(config).await?);
        }
        Ok(Self::from_clients(clients))
    }
}
