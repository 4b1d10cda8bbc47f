//! Event router: turns a signed delivery into a [`WebhookEvent`].

use thiserror::Error;

use super::events::WebhookEvent;
use super::parser::{ParseError, parse_webhook};
use super::signature::{SignatureError, verify_signature};

/// Header naming the event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the HMAC-SHA256 signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// One inbound delivery, as received over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    /// Value of `X-GitHub-Event`.
    pub event_type: Option<&'a str>,
    /// Value of `X-Hub-Signature-256`.
    pub signature: Option<&'a str>,
    pub payload: &'a [u8],
}

/// Where a delivery goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A recognized event to dispatch to the action pipeline.
    Event(WebhookEvent),
    /// A genuine delivery the controller has nothing to do for.
    Unrecognized { event_type: String },
}

/// A delivery that could not be authenticated or understood.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("malformed payload: {0}")]
    Malformed(#[from] ParseError),
}

/// Verifies and parses a delivery.
///
/// The signature is checked before anything else is read from the payload.
pub fn route(delivery: &Delivery<'_>, secret: &[u8]) -> Result<Route, RouteError> {
    let signature = delivery
        .signature
        .ok_or(RouteError::MissingHeader(HEADER_SIGNATURE))?;
    verify_signature(delivery.payload, signature, secret)?;

    let event_type = delivery
        .event_type
        .ok_or(RouteError::MissingHeader(HEADER_EVENT))?;

    Ok(match parse_webhook(event_type, delivery.payload)? {
        Some(event) => Route::Event(event),
        None => Route::Unrecognized {
            event_type: event_type.to_string(),
        },
    })
}
