//! Transaction identifier allocation.
//!
//! IDs are scoped to one logger instance so independent loggers (one per
//! test, one per server) never share a sequence.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier linking a logged request to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wrap a raw ID value, e.g. one carried back from a request extension.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TransactionId> for u64 {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

/// Lock-free, strictly increasing ID source.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: AtomicU64,
}

impl IdAllocator {
    /// Create an allocator whose first issued ID is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ID.
    ///
    /// `fetch_add` is a single RMW on the counter, so concurrent callers
    /// observe distinct values; relaxed ordering is enough since no other
    /// memory is published through it.
    pub fn next_id(&self) -> TransactionId {
        TransactionId(self.issued.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of IDs issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
