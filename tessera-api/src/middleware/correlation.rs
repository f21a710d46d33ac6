use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// Identifier tying together every log line of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

// ============================================================================
// Correlation ID Middleware
// ============================================================================

pub async fn correlation_id_middleware(mut req: Request, next: Next) -> Response {
    // 1. Reuse the caller's id when it is sane, otherwise mint one
    let id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_CORRELATION_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // 2. Expose it to handlers
    req.extensions_mut().insert(CorrelationId(id.clone()));

    // 3. Run the request inside a span carrying it
    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    // 4. Echo it back
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
