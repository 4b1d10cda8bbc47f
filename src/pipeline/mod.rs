//! Action Pipeline.
//!
//! Every inbound event is handled by a detached task that fans out to the
//! handlers registered for the event's kind. The handlers of one event run
//! concurrently and share a cancellation token and a deadline:
//!
//! - the first handler error cancels the token, so the other handlers stop at
//!   their next check
//! - the deadline stops waiting for all of them
//!
//! Nothing is returned to the HTTP caller, which has its response already.
//! The task logs the aggregate outcome and hands a [`DispatchReport`] to
//! whoever holds its `JoinHandle`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::actions::{ActionError, ActionHandler, ActionOutcome};
use crate::clients::AppClient;
use crate::config::{ActionKind, DEFAULT_WEBHOOK_TIMEOUT};
use crate::git::{ForkPusher, GitCli};
use crate::types::RepoId;
use crate::webhooks::{EventKind, WebhookEvent};

/// Why a dispatch did not complete cleanly.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{kind} action of client {client} failed: {source}")]
    Action {
        kind: ActionKind,
        client: String,
        #[source]
        source: ActionError,
    },

    #[error("action task failed: {0}")]
    Task(#[from] JoinError),

    #[error("event handling timed out after {0:?}")]
    TimedOut(Duration),
}

/// Aggregate result of handling one event.
#[derive(Debug)]
pub struct DispatchReport {
    pub kind: EventKind,
    pub repo: RepoId,
    /// Number of handlers the event was given to.
    pub handlers: usize,
    /// Outcomes of the handlers that succeeded, in completion order.
    pub outcomes: Vec<ActionOutcome>,
    /// The first failure, if any.
    pub error: Option<DispatchError>,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The handlers of one webhook endpoint.
pub struct ActionPipeline<C, P = GitCli> {
    handlers: Arc<[Arc<ActionHandler<C, P>>]>,
    timeout: Duration,
}

impl<C, P> Clone for ActionPipeline<C, P> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            timeout: self.timeout,
        }
    }
}

impl<C: AppClient, P: ForkPusher> ActionPipeline<C, P> {
    pub fn new(handlers: Vec<ActionHandler<C, P>>, timeout: Duration) -> Self {
        Self {
            handlers: handlers.into_iter().map(Arc::new).collect(),
            timeout,
        }
    }

    /// A pipeline with the default deadline.
    pub fn with_default_timeout(handlers: Vec<ActionHandler<C, P>>) -> Self {
        Self::new(handlers, DEFAULT_WEBHOOK_TIMEOUT)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handles `event` on a detached task.
    ///
    /// Dropping the handle does not stop the task.
    pub fn dispatch(&self, event: WebhookEvent) -> JoinHandle<DispatchReport> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run(event).await })
    }

    /// Handles `event` to completion or deadline.
    #[instrument(skip_all, fields(event = %event.kind(), repo = %event.repo()))]
    pub async fn run(&self, event: WebhookEvent) -> DispatchReport {
        let kind = event.kind();
        let repo = event.repo().clone();
        let event = Arc::new(event);
        let cancel = CancellationToken::new();

        let mut tasks = JoinSet::new();
        for handler in self.handlers.iter().filter(|h| h.handles(kind)) {
            let handler = Arc::clone(handler);
            let event = Arc::clone(&event);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = handler.handle(&event, &cancel).await;
                (handler.kind(), handler.client_name().to_string(), result)
            });
        }
        let handlers = tasks.len();
        debug!(handlers, "Dispatching event");

        let mut outcomes = Vec::with_capacity(handlers);
        let mut first_error = None;
        let joined = tokio::time::timeout(self.timeout, async {
            while let Some(joined) = tasks.join_next().await {
                let err = match joined {
                    Ok((_, _, Ok(outcome))) => {
                        outcomes.push(outcome);
                        continue;
                    }
                    Ok((kind, client, Err(source))) => DispatchError::Action {
                        kind,
                        client,
                        source,
                    },
                    Err(join_err) => DispatchError::Task(join_err),
                };
                cancel.cancel();
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    debug!(error = %err, "Further action failure");
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!(timeout = ?self.timeout, "Event handling timed out");
            cancel.cancel();
            tasks.detach_all();
            if first_error.is_none() {
                first_error = Some(DispatchError::TimedOut(self.timeout));
            }
        }

        match &first_error {
            None => info!(handlers, outcomes = ?outcomes, "Event handled"),
            Some(err) => error!(handlers, error = %err, "Error processing event"),
        }

        DispatchReport {
            kind,
            repo,
            handlers,
            outcomes,
            error: first_error,
        }
    }
}
