//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the diagnostic stream (stderr/stdout via tracing-subscriber)
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The HTTP traffic log is a separate file sink; it never goes through tracing

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directives for the configured level.
fn default_directives(level: &str) -> String {
    format!("http_traffic_log={level},tower_http={level}")
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed (e.g. called twice in tests).
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
