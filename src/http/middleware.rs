//! Request metrics middleware.
//!
//! Wraps every route, including the 404 fallback. The handler chain below it
//! converts panics into 500 responses, so recording always happens once the
//! chain returns, whatever the outcome.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::MetricsRegistry;

pub async fn track_metrics(
    State(registry): State<Arc<MetricsRegistry>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();
    registry.record_request(method.as_str(), &path, status.as_u16(), latency);

    tracing::debug!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = latency.as_secs_f64() * 1000.0,
        "Request recorded"
    );

    response
}
