//! HTTP traffic logging subsystem.
//!
//! # Data Flow
//! ```text
//! server middleware / logging client
//!     → logger.rs (gate on config, allocate or reuse ID)
//!     → id.rs (lock-free transaction IDs)
//!     → dump.rs (request/response → wire text)
//!     → frame.rs (BEGIN/END block around the dump)
//!     → sink.rs (single locked append to the log file)
//! ```
//!
//! # Design Decisions
//! - ID issuance never waits on file I/O: atomic counter, separate from the sink lock
//! - One block = one write, so concurrent transactions never interleave mid-block
//! - Logging failures are reported and returned, never allowed to abort HTTP handling

pub mod dump;
pub mod error;
pub mod frame;
pub mod id;
pub mod logger;
pub mod sink;

pub use dump::WireBody;
pub use error::{DumpError, TrafficLogError};
pub use frame::{Direction, Kind};
pub use id::{IdAllocator, TransactionId};
pub use logger::TrafficLogger;
