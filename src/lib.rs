//! Actions Controller - enforces an organizational workflow policy across
//! GitHub repositories.
//!
//! Workflow events are checked against a policy file carried by the
//! repository. Workflows of repositories without a valid policy file are
//! disabled and a tracking issue is filed. Maintainers can also trigger
//! builds of pull requests from forks with a comment command.

pub mod actions;
pub mod clients;
pub mod config;
pub mod effects;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod policy;
pub mod remediation;
pub mod server;
pub mod types;
pub mod validator;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
