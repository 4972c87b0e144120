//! Database-backed readiness and request metrics service.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use health::HealthState;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::MetricsRegistry;
