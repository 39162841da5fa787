//! Request scope and access logging.
//!
//! Every request runs inside a fresh database request scope, identified by a
//! newly generated request id. The id is attached to the tracing span, echoed
//! in the `X-Request-ID` response header, and logged with the outcome.

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use authgate_database::scoped_with_id;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Installs the request scope around the rest of the stack and logs the
/// request on entry and completion.
pub async fn request_scope(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let span = info_span!("request", %request_id);
    info!(parent: &span, %method, %path, "Request started");

    let mut response = scoped_with_id(request_id, next.run(request))
        .instrument(span.clone())
        .await;

    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        parent: &span,
        %method,
        %path,
        status = response.status().as_u16(),
        %size,
        duration_ms = whole_millis(start.elapsed()),
        "Request completed"
    );

    response
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_millis_saturates() {
        assert_eq!(whole_millis(Duration::from_micros(2_999)), 2);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }
}
