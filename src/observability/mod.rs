//! Observability subsystem.
//!
//! Diagnostics for the process itself: startup, shutdown, and the errors
//! the traffic logger reports immediately (dump and write failures).

pub mod logging;

pub use logging::init_logging;
