//! Background health prober.
//!
//! # Responsibilities
//! - Probe the database on a fixed interval, forever
//! - Publish each outcome to the shared `HealthState`
//! - Exit when the shutdown signal fires
//! - Treat a panicking probe as unreachable and keep going

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::probe::{Probe, ProbeResult};
use crate::health::state::HealthState;

pub struct HealthProber<P> {
    probe: P,
    state: HealthState,
    interval: Duration,
}

impl<P: Probe> HealthProber<P> {
    pub fn new(probe: P, state: HealthState, interval: Duration) -> Self {
        Self {
            probe,
            state,
            interval,
        }
    }

    /// Run one probe and publish its outcome.
    pub async fn check_once(&self) -> bool {
        let started = Instant::now();
        let result = match AssertUnwindSafe(self.probe.probe()).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Database probe panicked, treating as unreachable");
                ProbeResult::unreachable()
            }
        };
        let previous = self.state.set(result.success);

        tracing::debug!(
            connected = result.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Database probe completed"
        );

        match (previous, result.success) {
            (false, true) => tracing::info!("Database reachable, service ready"),
            (true, false) => tracing::warn!("Database unreachable, service not ready"),
            _ => {}
        }

        result.success
    }

    /// Probe until shutdown. The pause between attempts does not depend on
    /// the outcome: there is no backoff and no immediate retry.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Health prober starting"
        );

        loop {
            tokio::select! {
                _ = self.check_once() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Health prober received shutdown signal, exiting loop");
    }
}
