//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (assign/propagate request ID, open trace span)
//!     → middleware.rs (start timer ... record counter + latency)
//!     → handlers.rs (/live, /ready, /metrics, /stress)
//!     → error.rs (503/500 as {"detail": ...})
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer, ServerError};
