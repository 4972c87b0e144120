//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms; written by the request middleware)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → /metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)
//! - Process metrics are sampled at scrape time, not on a timer
//! - Request ID attached to every request span by the HTTP layer

pub mod logging;
pub mod metrics;

pub use self::metrics::MetricsRegistry;
