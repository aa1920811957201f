//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes, graceful shutdown)
//!     → middleware/traffic_log.rs (In Request block, ID into extensions)
//!         → body.rs (bounded capture, replayed when over the limit)
//!     → handler
//!         → client.rs (Out Request / Out Response blocks for upstream calls)
//!     → middleware/traffic_log.rs (In Response block)
//!     → Send to client
//! ```

pub mod body;
pub mod client;
pub mod middleware;
pub mod server;

pub use client::{ClientError, LoggingClient};
pub use server::HttpServer;
