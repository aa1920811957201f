//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the traffic-logging server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream that `/upstream/*` requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// HTTP traffic log settings.
    pub traffic_log: TrafficLogConfig,

    /// Diagnostic logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Upstream forwarding target.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL (e.g., "http://127.0.0.1:3000"). Forwarding is off when unset.
    pub url: Option<String>,
}

/// HTTP traffic log configuration.
///
/// Read concurrently by every in-flight transaction; never mutated after the
/// logger is built.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrafficLogConfig {
    /// Master switch. When off nothing is written, but IDs are still issued.
    pub enabled: bool,

    /// Log requests received by the server.
    pub log_inbound_request: bool,

    /// Log requests sent by the client.
    pub log_outbound_request: bool,

    /// Log responses produced by the server.
    pub log_inbound_response: bool,

    /// Log responses received by the client.
    pub log_outbound_response: bool,

    /// Include payload bytes in dumps.
    pub include_body: bool,

    /// Sink file name. A `%s` is replaced by the startup time
    /// (`YYYY_MM_DD_HHMMSS`). Empty means no sink.
    pub file_name: String,

    /// Largest body buffered for logging by the middleware and client.
    pub max_body_bytes: usize,
}

impl Default for TrafficLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_inbound_request: true,
            log_outbound_request: true,
            log_inbound_response: true,
            log_outbound_response: true,
            include_body: false,
            file_name: String::new(),
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
