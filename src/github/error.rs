//! GitHub API error types.
//!
//! Errors distinguish transient from permanent failures. The controller does
//! not retry (a failed candidate file is simply skipped, a failed remediation
//! is logged), but the kind is logged so operators can tell a rate limit or
//! outage from a misconfigured installation.

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Would likely succeed later: HTTP 5xx, 429, rate-limit 403s, network
    /// failures.
    Transient,

    /// Requires human intervention: most 4xx (missing permissions, unknown
    /// repository or workflow, validation failures).
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

impl fmt::Display for GitHubErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitHubErrorKind::Transient => write!(f, "transient"),
            GitHubErrorKind::Permanent => write!(f, "permanent"),
        }
    }
}

/// A GitHub API error with categorization.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates an error from a bare HTTP status returned by an endpoint that
    /// octocrab does not map to an error itself (raw `_put`/`_delete`).
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: kind_for_status(status, ""),
            status_code: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        };
        let message = err.to_string();

        let kind = match status_code {
            Some(code) => kind_for_status(code, &message),
            None if is_network_error(&message) => GitHubErrorKind::Transient,
            None => GitHubErrorKind::Permanent,
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Returns true for a 404, which the contents API uses for "no such path".
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }
}

fn kind_for_status(code: u16, message: &str) -> GitHubErrorKind {
    match code {
        429 => GitHubErrorKind::Transient,
        403 if is_rate_limit_error(message) => GitHubErrorKind::Transient,
        500..=599 => GitHubErrorKind::Transient,
        _ => GitHubErrorKind::Permanent,
    }
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}
