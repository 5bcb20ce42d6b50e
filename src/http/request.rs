//! Request identification.
//!
//! Every request gets an `x-request-id` (kept if the client sent one) that is
//! echoed on the response and recorded on the trace span.

use axum::{
    body::Body,
    http::{HeaderName, Request},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request id of a request, or `"unknown"` before the id layer ran.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Wrap `router` with id generation, a per-request span and id propagation.
///
/// Layers apply bottom-up, so the id is set before the span is created.
pub fn with_request_tracing(router: Router) -> Router {
    router
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| -> Span {
            tracing::info_span!(
                "request",
                request_id = %request_id(request),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}
