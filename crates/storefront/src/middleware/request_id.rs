//! Request ID middleware for request tracing and correlation.
//!
//! An `x-request-id` supplied by an upstream proxy is reused when it looks
//! sane (visible ASCII, at most [`MAX_REQUEST_ID_LEN`] bytes); otherwise a
//! UUID v4 is generated. The id is recorded on the request span, tagged on
//! the Sentry scope and echoed in the response.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header carrying the request ID.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest upstream request ID that is accepted as-is.
pub const MAX_REQUEST_ID_LEN: usize = 128;

fn upstream_id(value: &HeaderValue) -> Option<String> {
    let id = value.to_str().ok()?;
    let acceptable = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic());
    acceptable.then(|| id.to_string())
}

/// Ensure every request carries a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(upstream_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_accepted() {
        let value = HeaderValue::from_static("cf-8a7b6c");
        assert_eq!(upstream_id(&value).as_deref(), Some("cf-8a7b6c"));
    }

    #[test]
    fn test_upstream_id_rejected_when_odd() {
        assert!(upstream_id(&HeaderValue::from_static("has space")).is_none());
        assert!(upstream_id(&HeaderValue::from_static("")).is_none());

        let long = HeaderValue::from_str(&"a".repeat(MAX_REQUEST_ID_LEN + 1)).unwrap();
        assert!(upstream_id(&long).is_none());
    }
}
