//! Liveness and version endpoints.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK", for load balancers and liveness
/// probes.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Returns the package version.
pub async fn version_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, env!("CARGO_PKG_VERSION"))
}
