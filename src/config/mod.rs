//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to the server and the probe at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; running without a file is supported
//! - Database credentials are not part of the file, they are read from the
//!   environment on every probe attempt
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, DatabaseConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProbeConfig,
};
pub use validation::{validate_config, ValidationError};
