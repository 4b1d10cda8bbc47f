//! Effects-as-data for GitHub operations.
//!
//! Policy validation, remediation and the fork-build action describe what they
//! need from GitHub as [`GitHubEffect`] values. This enables:
//! - Core logic that is independent of the HTTP client
//! - Testability via mock interpreters
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{
    ContentEntry, EntryKind, GitHubEffect, GitHubResponse, PullRequestData, Reaction,
};
pub use interpreter::GitHubInterpreter;
