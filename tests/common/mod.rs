//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use healthwatch::config::AppConfig;
use healthwatch::health::{Probe, ProbeResult};
use healthwatch::{HealthState, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Probe whose outcome is flipped by the test, with an optional artificial
/// connection delay.
#[derive(Clone)]
pub struct ToggleProbe {
    reachable: Arc<AtomicBool>,
    delay: Duration,
}

impl ToggleProbe {
    pub fn new(reachable: bool, delay: Duration) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
            delay,
        }
    }

    #[allow(dead_code)]
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

impl Probe for ToggleProbe {
    async fn probe(&self) -> ProbeResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        ProbeResult::from(self.reachable.load(Ordering::SeqCst))
    }
}

/// A running server bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub probe: ToggleProbe,
    pub health: HealthState,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("server unreachable")
    }

    pub async fn metrics_text(&self) -> String {
        self.get("/metrics").await.text().await.unwrap()
    }

    pub async fn stop(self) {
        let TestServer {
            client,
            shutdown,
            handle,
            ..
        } = self;
        // Release pooled keep-alive connections so draining finishes quickly.
        drop(client);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}

/// Start a server whose prober uses `probe`, polling every `interval_ms`.
pub async fn start_server(probe: ToggleProbe, interval_ms: u64) -> TestServer {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.probe.interval_ms = interval_ms;

    let server = HttpServer::with_probe(&config, probe.clone()).unwrap();
    let health = server.state().health.clone();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        probe,
        health,
        client,
        shutdown,
        handle,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Sum the sample values of `series` lines carrying every label in `labels`.
#[allow(dead_code)]
pub fn sample_sum(text: &str, series: &str, labels: &[&str]) -> u64 {
    let prefix = format!("{series}{{");
    text.lines()
        .filter(|line| line.starts_with(&prefix))
        .filter(|line| labels.iter().all(|label| line.contains(label)))
        .filter_map(|line| line.rsplit(' ').next()?.parse::<f64>().ok())
        .map(|value| value as u64)
        .sum()
}
