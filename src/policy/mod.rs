//! Policy files and the compliance match rule.
//!
//! A policy file is a YAML (or JSON) document committed to a managed
//! repository:
//!
//! ```yaml
//! url: https://octodemo.com/acme
//! contactEmail: platform@acme.com
//! useCase: acme
//! repos:
//!   - acme/svc
//! ```
//!
//! A document is authoritative for a repository when its `url` is the
//! organization-scoped URL, its `useCase` names the organization, and, if
//! `repos` is non-empty, the repository appears in it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RepoId;

/// Base of the organization-scoped policy URL.
pub const DEFAULT_POLICY_BASE_URL: &str = "https://octodemo.com";

/// File extensions recognized as policy files.
pub const POLICY_FILE_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// A parsed policy file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub use_case: String,
    #[serde(default)]
    pub repos: Vec<String>,
}

impl PolicyDocument {
    /// Parses a policy document. JSON is accepted as a subset of YAML.
    pub fn parse(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }
}

/// Reasons a policy document does not cover a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyMismatch {
    #[error("policy url {found:?} does not match {expected:?}")]
    Url { expected: String, found: String },

    #[error("policy use case {found:?} does not match organization {expected:?}")]
    UseCase { expected: String, found: String },

    #[error("repository {repo} is not listed in policy repos")]
    RepoNotListed { repo: String },
}

/// What a policy document must declare to cover one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyExpectation {
    repo: RepoId,
    base_url: String,
}

impl PolicyExpectation {
    pub fn new(repo: RepoId) -> Self {
        Self::with_base_url(repo, DEFAULT_POLICY_BASE_URL)
    }

    pub fn with_base_url(repo: RepoId, base_url: impl Into<String>) -> Self {
        Self {
            repo,
            base_url: base_url.into(),
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// The URL a matching document must declare.
    pub fn expected_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.repo.owner)
    }

    /// Applies the match rule.
    ///
    /// `repos` entries may name the repository either as `owner/repo` or by
    /// its bare name. `contactEmail` is informational and not checked.
    pub fn check(&self, doc: &PolicyDocument) -> Result<(), PolicyMismatch> {
        let expected_url = self.expected_url();
        if doc.url != expected_url {
            return Err(PolicyMismatch::Url {
                expected: expected_url,
                found: doc.url.clone(),
            });
        }

        if doc.use_case != self.repo.owner {
            return Err(PolicyMismatch::UseCase {
                expected: self.repo.owner.clone(),
                found: doc.use_case.clone(),
            });
        }

        if !doc.repos.is_empty() {
            let full_name = self.repo.full_name();
            let listed = doc
                .repos
                .iter()
                .any(|entry| *entry == full_name || *entry == self.repo.repo);
            if !listed {
                return Err(PolicyMismatch::RepoNotListed { repo: full_name });
            }
        }

        Ok(())
    }
}

/// Returns true when `name` has a recognized policy file extension.
pub fn is_policy_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            POLICY_FILE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Strips leading and trailing slashes from a repository path.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}
