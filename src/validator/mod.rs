//! Policy validator.
//!
//! Decides whether a repository carries a policy file that covers it. Each
//! candidate directory is listed (once per run, see [`ContentCache`]), its
//! policy files are downloaded and parsed, and each document is checked
//! against the [`PolicyExpectation`] for the repository.
//!
//! # Concurrency
//!
//! Candidate paths are put in a shared queue drained by
//! `min(workers, paths)` tasks. The first worker to find a matching file
//! sends its path through a one-slot channel; the coordinator takes the first
//! message and stops waiting. When every worker has finished without sending,
//! the channel closes and the run is invalid.
//!
//! The whole run is bounded by a deadline and by the caller's cancellation
//! token. Both yield an invalid outcome: a run that could not prove
//! compliance is not compliant. Workers check the run's token between files
//! and are detached, not aborted, once the outcome is known.

mod cache;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::effects::{ContentEntry, EntryKind, GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::GitHubApiError;
use crate::policy::{
    DEFAULT_POLICY_BASE_URL, PolicyDocument, PolicyExpectation, PolicyMismatch, is_policy_file,
};
use crate::types::RepoId;

pub use cache::{CacheKey, ContentCache, Listing};

/// Default bound on one validation run.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a repository was found non-compliant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no candidate policy paths configured")]
    NoCandidatePaths,

    #[error("no valid policy file found{}", first_error_suffix(.first_error))]
    NoValidPolicy { first_error: Option<String> },

    #[error("policy validation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("policy validation cancelled")]
    Cancelled,
}

fn first_error_suffix(first_error: &Option<String>) -> String {
    first_error
        .as_ref()
        .map(|err| format!(" (first error: {err})"))
        .unwrap_or_default()
}

/// Result of one validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// A policy file covering the repository was found at `path`.
    Valid { path: String },
    Invalid(ValidationError),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid { .. })
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationOutcome::Valid { .. } => None,
            ValidationOutcome::Invalid(err) => Some(err),
        }
    }
}

/// Failure to use one candidate path or file. Logged and recorded, never
/// fatal to the run.
#[derive(Debug, Error)]
enum CandidateError {
    #[error("listing {path} failed: {message}")]
    Listing { path: String, message: String },

    #[error("fetching {path} failed: {source}")]
    Fetch {
        path: String,
        #[source]
        source: GitHubApiError,
    },

    #[error("parsing {path} failed: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: {source}")]
    Mismatch {
        path: String,
        #[source]
        source: PolicyMismatch,
    },

    #[error("unexpected {response} response for {path}")]
    UnexpectedResponse {
        path: String,
        response: &'static str,
    },
}

/// Settings of a validator, decoded from action arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    /// Candidate directories (or files) searched for policy files.
    pub paths: Vec<String>,
    /// Worker cap; defaults to one worker per path.
    pub workers: Option<usize>,
    /// Ref the policy is read from; the default branch when unset.
    pub git_ref: Option<String>,
    pub policy_base_url: String,
    pub timeout: Duration,
}

impl ValidatorSettings {
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths,
            workers: None,
            git_ref: None,
            policy_base_url: DEFAULT_POLICY_BASE_URL.to_string(),
            timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    /// Number of workers a run spawns.
    pub fn worker_count(&self) -> usize {
        let paths = self.paths.len();
        self.workers.unwrap_or(paths).clamp(1, paths.max(1))
    }
}

/// Checks repositories against the organization policy.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    settings: ValidatorSettings,
}

impl PolicyValidator {
    pub fn new(settings: ValidatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Validates `repo`, reading its contents through `api`.
    ///
    /// Returns within the configured timeout whatever the transport does.
    #[instrument(skip_all, fields(repo = %repo))]
    pub async fn validate<G>(
        &self,
        api: G,
        repo: &RepoId,
        cancel: &CancellationToken,
    ) -> ValidationOutcome
    where
        G: GitHubInterpreter<Error = GitHubApiError> + Send + Sync + 'static,
    {
        if self.settings.paths.is_empty() {
            warn!("No candidate policy paths configured");
            return ValidationOutcome::Invalid(ValidationError::NoCandidatePaths);
        }

        let run_cancel = cancel.child_token();
        let run = Arc::new(Run {
            api,
            expectation: PolicyExpectation::with_base_url(
                repo.clone(),
                self.settings.policy_base_url.clone(),
            ),
            git_ref: self.settings.git_ref.clone(),
            cache: ContentCache::new(),
            queue: Mutex::new(self.settings.paths.iter().cloned().collect()),
            first_error: OnceLock::new(),
            cancel: run_cancel.clone(),
        });

        let worker_count = self.settings.worker_count();
        debug!(
            paths = self.settings.paths.len(),
            workers = worker_count,
            "Starting policy validation"
        );

        let (found_tx, mut found_rx) = mpsc::channel(1);
        let mut workers = JoinSet::new();
        for _ in 0..worker_count {
            workers.spawn(run_worker(Arc::clone(&run), found_tx.clone()));
        }
        drop(found_tx);

        let timeout = self.settings.timeout;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => ValidationOutcome::Invalid(ValidationError::Cancelled),
            found = found_rx.recv() => match found {
                Some(path) => ValidationOutcome::Valid { path },
                None => ValidationOutcome::Invalid(ValidationError::NoValidPolicy {
                    first_error: run.first_error.get().cloned(),
                }),
            },
            () = tokio::time::sleep(timeout) => {
                ValidationOutcome::Invalid(ValidationError::TimedOut(timeout))
            }
        };

        run_cancel.cancel();
        workers.detach_all();

        match &outcome {
            ValidationOutcome::Valid { path } => info!(path = %path, "Repository policy is valid"),
            ValidationOutcome::Invalid(err) => warn!(error = %err, "Repository policy is not valid"),
        }
        outcome
    }
}

/// State shared by the workers of one run.
struct Run<G> {
    api: G,
    expectation: PolicyExpectation,
    git_ref: Option<String>,
    cache: ContentCache,
    queue: Mutex<VecDeque<String>>,
    first_error: OnceLock<String>,
    cancel: CancellationToken,
}

async fn run_worker<G>(run: Arc<Run<G>>, found: mpsc::Sender<String>)
where
    G: GitHubInterpreter<Error = GitHubApiError> + Send + Sync + 'static,
{
    while let Some(path) = run.next_path() {
        if run.cancel.is_cancelled() {
            return;
        }
        if let Some(file) = run.scan_path(&path).await {
            // A full slot means another worker already won.
            let _ = found.try_send(file);
            return;
        }
    }
}

impl<G> Run<G>
where
    G: GitHubInterpreter<Error = GitHubApiError> + Send + Sync + 'static,
{
    fn next_path(&self) -> Option<String> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Returns the path of the first matching policy file under `path`.
    async fn scan_path(&self, path: &str) -> Option<String> {
        let entries = match self.list(path).await {
            Ok(entries) => entries,
            Err(err) => {
                self.record(err);
                return None;
            }
        };

        let candidates = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File && is_policy_file(&entry.name));

        for entry in candidates {
            if self.cancel.is_cancelled() {
                return None;
            }
            match self.check_file(entry).await {
                Ok(()) => return Some(entry.path.clone()),
                Err(err) => self.record(err),
            }
        }
        None
    }

    async fn list(&self, path: &str) -> Result<Arc<Vec<ContentEntry>>, CandidateError> {
        let key = CacheKey::new(self.expectation.repo(), path);
        let effect = GitHubEffect::ListContents {
            path: key.path.clone(),
            git_ref: self.git_ref.clone(),
        };

        self.cache
            .get_or_list(key, || async move {
                match self.api.interpret(effect).await {
                    Ok(GitHubResponse::Contents(entries)) => Ok(Arc::new(entries)),
                    Ok(other) => Err(format!("unexpected {} response", other.name())),
                    Err(err) => Err(err.to_string()),
                }
            })
            .await
            .map_err(|message| CandidateError::Listing {
                path: path.to_string(),
                message,
            })
    }

    async fn check_file(&self, entry: &ContentEntry) -> Result<(), CandidateError> {
        let path = &entry.path;
        let response = self
            .api
            .interpret(GitHubEffect::GetFile {
                path: path.clone(),
                git_ref: self.git_ref.clone(),
            })
            .await
            .map_err(|source| CandidateError::Fetch {
                path: path.clone(),
                source,
            })?;

        let content = match response {
            GitHubResponse::File(content) => content,
            other => {
                return Err(CandidateError::UnexpectedResponse {
                    path: path.clone(),
                    response: other.name(),
                });
            }
        };

        let document = PolicyDocument::parse(&content).map_err(|source| CandidateError::Parse {
            path: path.clone(),
            source,
        })?;

        self.expectation
            .check(&document)
            .map_err(|source| CandidateError::Mismatch {
                path: path.clone(),
                source,
            })
    }

    fn record(&self, err: CandidateError) {
        warn!(
            repo = %self.expectation.repo(),
            error = %err,
            "Policy candidate rejected"
        );
        let _ = self.first_error.set(err.to_string());
    }
}
