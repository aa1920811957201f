//! Block framing.
//!
//! Every logged transaction becomes one block:
//!
//! ```text
//! '<timestamp>' <Direction> <Kind> '<id>' BEGIN ==========...
//! <wire dump>
//! '<timestamp>' <Direction> <Kind> '<id>' End ==========...
//! ```
//!
//! The whole block is rendered into one buffer so the sink can append it
//! with a single write.

use chrono::Local;

use crate::traffic::id::TransactionId;

/// Decorative rule following the BEGIN/END label.
pub const RULE: &str = "====================================================================";

/// Timestamp format on framing lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Which side of the process a transaction crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received by this process acting as a server.
    Inbound,
    /// Sent by this process acting as a client.
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => f.write_str("In"),
            Direction::Outbound => f.write_str("Out"),
        }
    }
}

/// Request or response half of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Request,
    Response,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Request => f.write_str("Request"),
            Kind::Response => f.write_str("Response"),
        }
    }
}

/// Word closing a block. Outbound requests have always been closed with
/// `END`; the other three kinds with `End`. Readers match on either.
fn closing_word(direction: Direction, kind: Kind) -> &'static str {
    match (direction, kind) {
        (Direction::Outbound, Kind::Request) => "END",
        _ => "End",
    }
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn marker_line(out: &mut Vec<u8>, direction: Direction, kind: Kind, id: TransactionId, word: &str) {
    let line = format!("'{}' {} {} '{}' {} {} \n", timestamp(), direction, kind, id, word, RULE);
    out.extend_from_slice(line.as_bytes());
}

/// Render a complete block around an already-dumped transaction.
pub fn render_block(direction: Direction, kind: Kind, id: TransactionId, dump: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(dump.len() + 2 * (RULE.len() + 64));
    marker_line(&mut out, direction, kind, id, "BEGIN");
    out.extend_from_slice(dump);
    out.push(b'\n');
    marker_line(&mut out, direction, kind, id, closing_word(direction, kind));
    out
}
