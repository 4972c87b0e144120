//! healthwatch
//!
//! Reports process liveness, database readiness and request metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ metrics middleware ─▶ handler
//!                                                │                    │
//!                                                ▼                    ▼
//!                                        MetricsRegistry        HealthState
//!                                                ▲                    ▲
//!                                           GET /metrics       HealthProber ──▶ PostgreSQL
//!                                                              (background task)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use healthwatch::config::{self, AppConfig};
use healthwatch::lifecycle::{shutdown_signal, Shutdown};
use healthwatch::observability::logging;
use healthwatch::HttpServer;

#[derive(Parser)]
#[command(name = "healthwatch")]
#[command(about = "Liveness, database readiness and request metrics over HTTP", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "HEALTHWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("healthwatch: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("healthwatch: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "healthwatch exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<AppConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    Ok(config)
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "healthwatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database_host = %config.database.host,
        database_port = config.database.port,
        probe_interval_ms = config.probe.interval_ms,
        connect_timeout_ms = config.probe.connect_timeout_ms,
        "Configuration loaded"
    );

    let server = HttpServer::new(&config)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }
    shutdown.trigger();

    server_task.await??;
    Ok(())
}
