//! Database connectivity probe.
//!
//! # Responsibilities
//! - Attempt one connection to the database, bounded by a timeout
//! - Close the connection again on success
//! - Fold every failure (timeout, auth, network, TLS) into a single outcome

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tokio::time;

use crate::config::DatabaseConfig;

/// Environment variable holding the database name.
pub const ENV_DATABASE: &str = "POSTGRES_DB";
/// Environment variable holding the user name.
pub const ENV_USER: &str = "POSTGRES_USER";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "POSTGRES_PASSWORD";

/// Outcome of a single probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// Whether the connection was established.
    pub success: bool,
}

impl ProbeResult {
    pub fn reachable() -> Self {
        Self { success: true }
    }

    pub fn unreachable() -> Self {
        Self { success: false }
    }
}

impl From<bool> for ProbeResult {
    fn from(success: bool) -> Self {
        Self { success }
    }
}

/// One connectivity check against an external dependency.
///
/// Implementations must not return errors: every failure is an
/// unreachable result.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self) -> impl Future<Output = ProbeResult> + Send;
}

/// Credentials read from the process environment.
///
/// Unset variables are left to the driver's own defaults.
#[derive(Clone, Default)]
pub struct DatabaseCredentials {
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseCredentials {
    pub fn from_env() -> Self {
        Self {
            database: std::env::var(ENV_DATABASE).ok(),
            user: std::env::var(ENV_USER).ok(),
            password: std::env::var(ENV_PASSWORD).ok(),
        }
    }
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// PostgreSQL connection probe.
#[derive(Debug, Clone)]
pub struct PostgresProbe {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl PostgresProbe {
    pub fn new(config: &DatabaseConfig, connect_timeout: Duration) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            connect_timeout,
        }
    }

    /// Build connection options. Credentials are re-read on every call.
    fn connect_options(&self, credentials: &DatabaseCredentials) -> PgConnectOptions {
        let mut options = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(database) = &credentials.database {
            options = options.database(database);
        }
        if let Some(user) = &credentials.user {
            options = options.username(user);
        }
        if let Some(password) = &credentials.password {
            options = options.password(password);
        }
        options
    }
}

impl Probe for PostgresProbe {
    async fn probe(&self) -> ProbeResult {
        let options = self.connect_options(&DatabaseCredentials::from_env());

        match time::timeout(self.connect_timeout, PgConnection::connect_with(&options)).await {
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(host = %self.host, error = %e, "Probe connection close failed");
                    return ProbeResult::unreachable();
                }
                ProbeResult::reachable()
            }
            Ok(Err(e)) => {
                tracing::debug!(host = %self.host, port = self.port, error = %e, "Probe failed: connection error");
                ProbeResult::unreachable()
            }
            Err(_) => {
                tracing::debug!(
                    host = %self.host,
                    port = self.port,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "Probe failed: timeout"
                );
                ProbeResult::unreachable()
            }
        }
    }
}
