//! GitHub App installation client backed by octocrab.

use octocrab::Octocrab;
use octocrab::models::{AppId, InstallationId};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::config::{ClientConfig, ConfigError};
use crate::github::OctocrabClient;
use crate::types::RepoId;

use super::{AppClient, ClientError};

/// A GitHub App authenticated against one organization installation.
///
/// Holds two octocrab handles: the app (JWT) client, used to mint
/// installation tokens, and the installation client used for API calls.
#[derive(Clone)]
pub struct GitHubAppClient {
    name: String,
    organization: String,
    repository: Option<String>,
    app: Octocrab,
    installation: Octocrab,
    installation_id: InstallationId,
}

impl GitHubAppClient {
    /// Authenticates as the app and resolves the organization installation.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let auth = config
            .github
            .as_ref()
            .ok_or_else(|| ConfigError::MissingClientConfig(config.name.clone()))?;

        let pem = tokio::fs::read(&auth.key_path)
            .await
            .map_err(|source| ClientError::KeyRead {
                path: auth.key_path.clone(),
                source,
            })?;
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(&pem).map_err(|source| {
            ClientError::InvalidKey {
                path: auth.key_path.clone(),
                source,
            }
        })?;

        let auth_error = |source| ClientError::Auth {
            client: config.name.clone(),
            source,
        };

        let mut builder = Octocrab::builder().app(AppId(auth.app_id), key);
        if let Some(server) = &config.server_info {
            debug!(client = %config.name, base_url = %server.base_url, "Using GitHub Enterprise server");
            builder = builder
                .base_uri(server.base_url.as_str())
                .map_err(auth_error)?;
        }
        let app = builder.build().map_err(auth_error)?;

        let installation = app
            .apps()
            .get_org_installation(&config.organization)
            .await
            .map_err(auth_error)?;
        let (installation_client, _token) = app
            .installation_and_token(installation.id)
            .await
            .map_err(auth_error)?;

        info!(
            client = %config.name,
            org = %config.organization,
            installation_id = %installation.id,
            "Authenticated GitHub App client"
        );

        Ok(Self {
            name: config.name.clone(),
            organization: config.organization.clone(),
            repository: config.repository.clone(),
            app,
            installation: installation_client,
            installation_id: installation.id,
        })
    }
}

impl AppClient for GitHubAppClient {
    type Api = OctocrabClient;

    fn name(&self) -> &str {
        &self.name
    }

    fn organization(&self) -> &str {
        &self.organization
    }

    fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    fn api(&self, repo: RepoId) -> OctocrabClient {
        OctocrabClient::new(self.installation.clone(), repo)
    }

    async fn installation_token(&self) -> Result<SecretString, ClientError> {
        let (_, token) = self
            .app
            .installation_and_token(self.installation_id)
            .await
            .map_err(|source| ClientError::Auth {
                client: self.name.clone(),
                source,
            })?;
        Ok(token)
    }
}

impl std::fmt::Debug for GitHubAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAppClient")
            .field("name", &self.name)
            .field("organization", &self.organization)
            .field("repository", &self.repository)
            .field("installation_id", &self.installation_id)
            .finish_non_exhaustive()
    }
}
