//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_requests_total` (counter): requests by method, endpoint, status
//! - `app_request_latency_seconds` (histogram): latency by endpoint
//! - `process_*` (cpu, memory, fds, start time): sampled on every render
//!
//! # Design Decisions
//! - The Prometheus recorder is owned by the registry, never installed
//!   globally; every update goes through `metrics::with_local_recorder`
//! - Counter and histogram updates are atomic, so concurrent requests never
//!   lose increments
//! - Rendering reads the current values without blocking writers
//! - Both request families are always present in the output, with header
//!   lines only until the first request is recorded
//! - Histogram samples are buffered until drained; `run_upkeep_loop` drains
//!   them even when nobody scrapes

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use metrics_process::Collector;
use tokio::sync::broadcast;
use tokio::time;

pub const REQUEST_COUNT: &str = "app_requests_total";
pub const REQUEST_LATENCY: &str = "app_request_latency_seconds";

const REQUEST_COUNT_HELP: &str = "Total HTTP Requests";
const REQUEST_LATENCY_HELP: &str = "Request latency";

/// How often buffered histogram samples are drained.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Latency histogram bucket boundaries, in seconds.
pub const LATENCY_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 2.0];

/// Process-wide request metrics.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: Collector,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY.to_string()), &LATENCY_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        let process = Collector::default();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!(REQUEST_COUNT, REQUEST_COUNT_HELP);
            describe_histogram!(REQUEST_LATENCY, REQUEST_LATENCY_HELP);
            process.describe();
        });

        Ok(Self {
            recorder,
            handle,
            process,
        })
    }

    pub fn shared() -> Result<Arc<Self>, BuildError> {
        Self::new().map(Arc::new)
    }

    /// Count one completed request and observe its latency.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, latency: Duration) {
        metrics::with_local_recorder(&self.recorder, || {
            counter!(
                REQUEST_COUNT,
                "method" => method.to_owned(),
                "endpoint" => endpoint.to_owned(),
                "status" => status.to_string()
            )
            .increment(1);

            histogram!(REQUEST_LATENCY, "endpoint" => endpoint.to_owned())
                .record(latency.as_secs_f64());
        });
    }

    /// Render every series in the Prometheus text exposition format.
    ///
    /// Process metrics are sampled first. A request family with no series
    /// yet is still announced by its `# HELP` and `# TYPE` lines.
    pub fn render(&self) -> String {
        metrics::with_local_recorder(&self.recorder, || self.process.collect());
        let body = self.handle.render();

        let mut headers = String::new();
        for (name, help, kind) in [
            (REQUEST_COUNT, REQUEST_COUNT_HELP, "counter"),
            (REQUEST_LATENCY, REQUEST_LATENCY_HELP, "histogram"),
        ] {
            if !body.contains(&format!("# TYPE {name} ")) {
                headers.push_str(&format!("# HELP {name} {help}\n# TYPE {name} {kind}\n"));
            }
        }

        if headers.is_empty() {
            body
        } else {
            headers + &body
        }
    }

    /// Drain buffered histogram samples into their aggregated form.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }
}

/// Run upkeep every `interval` until shutdown.
pub async fn run_upkeep_loop(
    registry: Arc<MetricsRegistry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => registry.run_upkeep(),
            _ = shutdown.recv() => break,
        }
    }

    tracing::debug!("Metrics upkeep stopped");
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}
