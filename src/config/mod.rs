//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → TrafficLogConfig handed to the traffic logger at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the traffic logger never re-reads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig, TrafficLogConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
