//! Correlation ID middleware.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use common::wire::CORRELATION_ID_HEADER;
use common::{CorrelationId, correlation};
use tracing::Instrument;

fn correlation_id_from_headers(headers: &HeaderMap) -> Option<CorrelationId> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(CorrelationId::new)
}

/// Runs the request inside a correlation scope and echoes the ID.
///
/// The inbound `X-Correlation-ID` is reused when present, otherwise a new one
/// is generated. Every log line emitted while serving the request carries it
/// through the `request` span, and outbound calls to the hotel service
/// forward it.
pub async fn correlation_middleware(req: Request<Body>, next: Next) -> Response {
    let correlation_id =
        correlation_id_from_headers(req.headers()).unwrap_or_else(CorrelationId::generate);

    let span = tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut response = correlation::scope(correlation_id.clone(), next.run(req))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
