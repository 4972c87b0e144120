//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! prober.rs:
//!     Fixed interval
//!     → probe.rs (connect to the database, bounded by a timeout)
//!     → state.rs (publish connected / not connected)
//!
//! Readers:
//!     /ready handler → state.rs
//! ```
//!
//! # Design Decisions
//! - The prober is the only writer of the health state
//! - Probe failures are never surfaced as errors, they become state
//! - Fixed interval, no backoff: the next attempt is always one interval away

pub mod probe;
pub mod prober;
pub mod state;

pub use probe::{PostgresProbe, Probe, ProbeResult};
pub use prober::HealthProber;
pub use state::HealthState;
