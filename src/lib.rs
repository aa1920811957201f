//! HTTP request/response traffic logging.
//!
//! A [`TrafficLogger`] is shared by every in-flight transaction of a server.
//! Each inbound or outbound request gets a strictly increasing transaction
//! ID; the request and its response are dumped as wire text into one
//! append-only file, each framed by BEGIN/END marker lines.

// Core
pub mod config;
pub mod traffic;

// Server and client integration
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{ServerConfig, TrafficLogConfig};
pub use http::{HttpServer, LoggingClient};
pub use lifecycle::Shutdown;
pub use traffic::{TrafficLogError, TrafficLogger, TransactionId};
