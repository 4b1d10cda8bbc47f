//! Core domain identifiers shared across the controller.

pub mod ids;

pub use ids::{CommentId, IssueNumber, RepoId, WorkflowRef};
