//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Payload parsing into the [`WebhookEvent`] sum type
//! - The event router used by the HTTP layer

pub mod events;
pub mod parser;
pub mod router;
pub mod signature;

pub use events::{EventKind, IssueCommentEvent, WebhookEvent, WorkflowEvent};
pub use parser::{ParseError, parse_webhook};
pub use router::{Delivery, HEADER_EVENT, HEADER_SIGNATURE, Route, RouteError, route};
pub use signature::{
    SignatureError, compute_signature, format_signature_header, parse_signature_header,
    verify_signature,
};
