//! Request identification and span helpers for the webhook HTTP surface.
//!
//! # Design
//! - `x-request-id` is generated when absent and echoed on the response.
//! - Request spans carry the id so every orchestration log line can be correlated.

use http::Request;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

use crate::init::build_sha;

/// Header carrying the per-request correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer that stamps a UUID `x-request-id` on requests that lack one.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Build the `http.request` span for an inbound request.
///
/// `status_code` and `latency_ms` start empty and are recorded once the response is known.
pub fn request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
        request_id = %request_id,
        build_sha = %build_sha(),
        status_code = tracing::field::Empty,
        latency_ms = tracing::field::Empty
    )
}
