//! Endpoint handlers.
//!
//! Handlers only read shared state. Request metrics are written by the
//! middleware in `middleware.rs`, never here.

use std::hint::black_box;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::health::HealthState;
use crate::http::error::ApiError;
use crate::observability::MetricsRegistry;

/// Exclusive upper bound of the `/stress` summation.
pub const STRESS_UPPER_BOUND: u64 = 10_000_000;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StressBody {
    pub done: u64,
}

/// GET /live
pub async fn live() -> Json<StatusBody> {
    Json(StatusBody { status: "alive" })
}

/// GET /ready
pub async fn ready(State(health): State<HealthState>) -> Result<Json<StatusBody>, ApiError> {
    if health.get() {
        Ok(Json(StatusBody { status: "ready" }))
    } else {
        Err(ApiError::ServiceUnavailable("Database unreachable"))
    }
}

/// GET /metrics
pub async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        registry.render(),
    )
}

/// GET /stress
///
/// Burns CPU on the blocking pool so the async workers keep serving.
pub async fn stress() -> Result<Json<StressBody>, ApiError> {
    let done = tokio::task::spawn_blocking(|| sum_below(STRESS_UPPER_BOUND))
        .await
        .map_err(|e| ApiError::Internal(format!("stress computation failed: {e}")))?;

    Ok(Json(StressBody { done }))
}

/// Sum of `0..upper`, computed one term at a time.
///
/// `black_box` keeps the optimizer from replacing the loop with the closed form.
pub fn sum_below(upper: u64) -> u64 {
    (0..upper).fold(0u64, |acc, n| acc + black_box(n))
}
