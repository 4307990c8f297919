//! Request ID middleware for request tracing and correlation.
//!
//! Every request gets a request ID that is:
//! - Recorded in the current tracing span
//! - Added to the Sentry scope for error correlation
//! - Returned in the response headers

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound request ID we will echo back instead of replacing.
const MAX_INBOUND_ID_LEN: usize = 64;

/// Middleware that ensures every request has a unique request ID.
///
/// An `x-request-id` header supplied by an upstream proxy is reused so log
/// lines correlate across hops, but only when it looks sane (printable ASCII,
/// bounded length); anything else is replaced with a fresh UUID v4.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let inbound = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_usable_id(id));

    let request_id = inbound.map_or_else(|| Uuid::new_v4().to_string(), String::from);

    // Record in current span for structured logging
    Span::current().record("request_id", &request_id);

    // Set in Sentry scope for error correlation
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    // Add to response headers so clients can reference the request ID
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn is_usable_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_INBOUND_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_ids() {
        assert!(is_usable_id("req-123"));
        assert!(is_usable_id(&Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_rejected_ids() {
        assert!(!is_usable_id(""));
        assert!(!is_usable_id("has space"));
        assert!(!is_usable_id(&"x".repeat(65)));
    }
}
