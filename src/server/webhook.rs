//! Webhook endpoint handler.
//!
//! Verifies and parses the delivery, then detaches the dispatch to the
//! endpoint's action pipeline and answers immediately. The response says
//! nothing about how the actions went.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use super::WebhookState;
use crate::clients::AppClient;
use crate::git::ForkPusher;
use crate::webhooks::{Delivery, HEADER_EVENT, HEADER_SIGNATURE, Route, RouteError, route};

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "workflow_run", "issue_comment")
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: event dispatched, or nothing to do for it
/// - 500 Internal Server Error: missing or invalid signature, malformed payload
pub async fn webhook_handler<C, P>(
    State(state): State<WebhookState<C, P>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), RouteError>
where
    C: AppClient,
    P: ForkPusher,
{
    let delivery = Delivery {
        event_type: get_header(&headers, HEADER_EVENT),
        signature: get_header(&headers, HEADER_SIGNATURE),
        payload: &body,
    };

    match route(&delivery, state.secret()) {
        Ok(Route::Event(event)) => {
            info!(
                event = %event.kind(),
                repo = %event.repo(),
                sender = %event.sender(),
                "Dispatching webhook event"
            );
            drop(state.pipeline().dispatch(event));
            Ok((StatusCode::OK, "OK"))
        }
        Ok(Route::Unrecognized { event_type }) => {
            debug!(event_type = %event_type, "Ignoring webhook event");
            Ok((StatusCode::OK, "OK"))
        }
        Err(err) => {
            warn!(error = %err, "Rejected webhook delivery");
            Err(err)
        }
    }
}

/// Extracts a header value as a string, if present and valid UTF-8.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, HeaderValue::from_static("workflow_run"));
        assert_eq!(get_header(&headers, HEADER_EVENT), Some("workflow_run"));
    }

    #[test]
    fn get_header_missing_or_binary() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_SIGNATURE,
            HeaderValue::from_bytes(&[0x80, 0x81]).unwrap(),
        );
        assert_eq!(get_header(&headers, HEADER_EVENT), None);
        assert_eq!(get_header(&headers, HEADER_SIGNATURE), None);
    }

    #[test]
    fn route_errors_are_500() {
        let response = RouteError::MissingHeader(HEADER_SIGNATURE).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
