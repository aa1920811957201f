//! Traffic logger error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::traffic::frame::{Direction, Kind};
use crate::traffic::id::TransactionId;

/// Errors that can occur while rendering a transaction to wire text.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Outbound request has neither a `Host` header nor a URI authority.
    #[error("no Host in request URL: {0}")]
    MissingHost(String),

    /// Body is a live stream and cannot be read without consuming it.
    #[error("body is not buffered; supply a readable copy to dump it")]
    UnbufferedBody,
}

/// Errors surfaced by the traffic logger.
#[derive(Debug, Error)]
pub enum TrafficLogError {
    /// Sink could not be opened at construction time.
    #[error("error opening HTTP log file '{}': {source}", path.display())]
    Configuration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transaction could not be rendered to its wire-text form.
    #[error("error dumping HTTP {direction} {kind} '{id}': {source}")]
    Serialization {
        id: TransactionId,
        direction: Direction,
        kind: Kind,
        #[source]
        source: DumpError,
    },
}

impl TrafficLogError {
    /// Transaction ID allocated for the failed call, if any.
    ///
    /// Request entry points allocate before rendering, so a serialization
    /// failure still hands the caller the ID it must pass to the response.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            TrafficLogError::Configuration { .. } => None,
            TrafficLogError::Serialization { id, .. } => Some(*id),
        }
    }
}
