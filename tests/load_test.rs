//! Concurrent load: no request may be lost from the metrics.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::Value;

mod common;
use common::{sample_sum, start_server, ToggleProbe};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_all_counted() {
    let server = start_server(ToggleProbe::new(true, Duration::ZERO), 50).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let start = Instant::now();
    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = server.client.clone();
        let url = server.url("/live");
        tasks.push(tokio::spawn(async move {
            let mut ok = 0usize;
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.expect("server unreachable");
                if res.status() == StatusCode::OK {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        succeeded += task.await.unwrap();
    }
    let duration = start.elapsed();
    assert_eq!(succeeded, total_requests);

    let text = server.metrics_text().await;
    let counted = sample_sum(&text, "app_requests_total", &["endpoint=\"/live\""]);
    let observed = sample_sum(&text, "app_request_latency_seconds_count", &["endpoint=\"/live\""]);
    assert_eq!(counted, total_requests as u64);
    assert_eq!(observed, total_requests as u64);

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!(
        "Requests/sec:   {:.2}",
        total_requests as f64 / duration.as_secs_f64()
    );
    println!("-------------------------\n");

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stress_calls_are_deterministic() {
    let server = start_server(ToggleProbe::new(true, Duration::ZERO), 50).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let client = server.client.clone();
        let url = server.url("/stress");
        tasks.push(tokio::spawn(async move {
            let res = client.get(&url).send().await.expect("server unreachable");
            assert_eq!(res.status(), StatusCode::OK);
            res.json::<Value>().await.unwrap()
        }));
    }

    // Liveness stays responsive while the stress calls run.
    assert_eq!(server.get("/live").await.status(), StatusCode::OK);

    for task in tasks {
        let body = task.await.unwrap();
        assert_eq!(body["done"].as_u64(), Some(49_999_995_000_000));
    }

    let text = server.metrics_text().await;
    assert_eq!(
        sample_sum(&text, "app_requests_total", &["endpoint=\"/stress\"", "status=\"200\""]),
        4
    );
    assert_eq!(
        sample_sum(&text, "app_request_latency_seconds_count", &["endpoint=\"/stress\""]),
        4
    );

    server.stop().await;
}

#[tokio::test]
async fn test_metrics_exposition_is_well_formed() {
    let server = start_server(ToggleProbe::new(false, Duration::ZERO), 50).await;
    server.get("/live").await;
    server.get("/ready").await;

    let res = server.get("/metrics").await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/plain"));

    let text = res.text().await.unwrap();
    assert!(text.contains("# TYPE app_requests_total counter"));
    assert!(text.contains("# TYPE app_request_latency_seconds histogram"));

    // Every sample line is `name{labels} value` with a numeric, non-negative value.
    for line in text.lines().filter(|l| !l.is_empty() && !l.starts_with('#')) {
        let value = line.rsplit(' ').next().unwrap();
        let value: f64 = value
            .parse()
            .unwrap_or_else(|_| panic!("non-numeric sample in line `{line}`"));
        assert!(value >= 0.0, "negative sample in line `{line}`");
    }

    server.stop().await;
}
