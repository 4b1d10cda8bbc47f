//! HTTP server for the actions controller.
//!
//! # Endpoints
//!
//! - `POST <serve-path>` - one per configured webhook; verifies the delivery
//!   and dispatches it to that webhook's actions (returns 200)
//! - `GET /health` - Returns 200 if server is running
//! - `GET /version` - Returns the package version

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::clients::AppClient;
use crate::git::{ForkPusher, GitCli};
use crate::pipeline::ActionPipeline;

pub mod health;
pub mod webhook;

pub use health::{health_handler, version_handler};
pub use webhook::webhook_handler;

/// State of one webhook endpoint.
///
/// This is passed to the handler via Axum's `State` extractor.
pub struct WebhookState<C, P = GitCli> {
    inner: Arc<WebhookStateInner<C, P>>,
}

struct WebhookStateInner<C, P> {
    /// Secret for HMAC-SHA256 signature verification.
    secret: Vec<u8>,
    pipeline: ActionPipeline<C, P>,
}

impl<C, P> Clone for WebhookState<C, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: AppClient, P: ForkPusher> WebhookState<C, P> {
    pub fn new(secret: impl Into<Vec<u8>>, pipeline: ActionPipeline<C, P>) -> Self {
        WebhookState {
            inner: Arc::new(WebhookStateInner {
                secret: secret.into(),
                pipeline,
            }),
        }
    }

    /// Returns the webhook secret.
    pub fn secret(&self) -> &[u8] {
        &self.inner.secret
    }

    pub fn pipeline(&self) -> &ActionPipeline<C, P> {
        &self.inner.pipeline
    }
}

/// Builds the axum Router with all endpoints.
///
/// `webhooks` pairs each serve path with the state of its endpoint.
pub fn build_router<C, P>(webhooks: impl IntoIterator<Item = (String, WebhookState<C, P>)>) -> Router
where
    C: AppClient,
    P: ForkPusher,
{
    let router = webhooks
        .into_iter()
        .fold(Router::new(), |router, (path, state)| {
            router.merge(
                Router::new()
                    .route(&path, post(webhook_handler::<C, P>))
                    .with_state(state),
            )
        });

    router
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
}
