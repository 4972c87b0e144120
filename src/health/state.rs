//! Shared database connectivity flag.
//!
//! # Design Decisions
//! - Single atomic cell: reads never block and never observe a torn value
//! - One writer (the prober), any number of readers (request handlers)
//! - Starts as "not connected" until a probe succeeds

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the connectivity flag.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    connected: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new state in the "not connected" position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the outcome of the latest probe.
    ///
    /// Returns the previous value so the caller can log transitions.
    pub fn set(&self, connected: bool) -> bool {
        self.connected.swap(connected, Ordering::AcqRel)
    }

    /// Whether the last completed probe reached the database.
    pub fn get(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
