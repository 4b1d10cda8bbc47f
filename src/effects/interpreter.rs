//! Effect interpreter trait.
//!
//! The trait-based design enables:
//! - The octocrab-backed interpreter used in production
//! - Recording mock interpreters for testing

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed for one repository, so all effects
/// executed through a single interpreter instance are scoped to it.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = anyhow::Error;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| anyhow!("unexpected effect: {:?}", effect))
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}
