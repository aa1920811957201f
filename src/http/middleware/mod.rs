//! Middleware applied to every inbound request.

pub mod traffic_log;

pub use traffic_log::traffic_log_middleware;
