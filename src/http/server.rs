//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, panic recovery)
//! - Spawn the database health prober, exactly once
//! - Spawn the metrics upkeep task
//! - Serve until the shutdown signal fires

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRef,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::health::{HealthProber, HealthState, PostgresProbe, Probe};
use crate::http::error::ApiError;
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics::{self, MetricsRegistry, UPKEEP_INTERVAL};

/// Error type for server startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build metrics registry: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthState,
    pub metrics: Arc<MetricsRegistry>,
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

impl FromRef<AppState> for Arc<MetricsRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// HTTP server plus the background prober it owns.
pub struct HttpServer<P = PostgresProbe> {
    router: Router,
    state: AppState,
    prober: HealthProber<P>,
}

impl HttpServer<PostgresProbe> {
    /// Create a server that probes the configured PostgreSQL database.
    pub fn new(config: &AppConfig) -> Result<Self, ServerError> {
        let probe = PostgresProbe::new(&config.database, config.probe.connect_timeout());
        Self::with_probe(config, probe)
    }
}

impl<P: Probe> HttpServer<P> {
    /// Create a server with a custom probe.
    pub fn with_probe(config: &AppConfig, probe: P) -> Result<Self, ServerError> {
        let state = AppState {
            health: HealthState::new(),
            metrics: MetricsRegistry::shared()?,
        };
        let prober = HealthProber::new(probe, state.health.clone(), config.probe.interval());
        let router = build_router(state.clone());

        Ok(Self {
            router,
            state,
            prober,
        })
    }

    /// Shared state, for inspection.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let prober_shutdown = shutdown.resubscribe();
        let prober = tokio::spawn(self.prober.run(prober_shutdown));
        let upkeep = tokio::spawn(metrics::run_upkeep_loop(
            self.state.metrics.clone(),
            UPKEEP_INTERVAL,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Err(e) = prober.await {
            tracing::error!(error = %e, "Health prober task failed");
        }
        if let Err(e) = upkeep.await {
            tracing::error!(error = %e, "Metrics upkeep task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    with_layers(routes(), state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(handlers::live))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .route("/stress", get(handlers::stress))
}

/// Innermost first: panics become 500s before the metrics middleware sees
/// the response, and the request ID is set before the trace span opens.
fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.metrics.clone(), track_metrics))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(set_request_id_layer())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    ApiError::Internal("Internal Server Error".to_string()).into_response()
}
