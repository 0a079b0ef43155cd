//! Request middleware.

use axum::body::Body;
use axum::http::{Request, header::USER_AGENT};
use tracing::{Span, info_span};

/// Span wrapping one HTTP request.
///
/// Carries the method, URI and user agent so every event logged while
/// handling the request can be traced back to it.
pub fn request_span(request: &Request<Body>) -> Span {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        user_agent,
    )
}
