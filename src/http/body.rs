//! Bounded body capture for the traffic log.
//!
//! # Responsibilities
//! - Read a body up to a byte limit so it can be dumped
//! - Hand back a body that replays exactly what the peer sent, whether or
//!   not the limit was hit
//!
//! # Design Decisions
//! - Bodies with unknown length (chunked) are read frame by frame rather
//!   than rejected up front
//! - Overflow never truncates: frames already read are replayed ahead of
//!   the unread remainder

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes, HttpBody};
use http_body_util::BodyExt;
use hyper::body::{Frame, SizeHint};

/// Result of reading a body against a limit.
pub enum Captured {
    /// The whole payload, within the limit.
    Complete(Bytes),
    /// Limit exceeded or trailers present. The body is intact for the
    /// receiver but the payload is not available for dumping.
    Passthrough(Body),
}

/// Read `body` for dumping if it fits in `limit` bytes.
///
/// A body whose size hint already exceeds `limit` is passed through
/// without reading a single frame.
pub async fn capture(mut body: Body, limit: usize) -> Result<Captured, axum::Error> {
    if body.size_hint().lower() > limit as u64 {
        return Ok(Captured::Passthrough(body));
    }

    let mut frames = VecDeque::new();
    let mut len = 0usize;

    while let Some(frame) = body.frame().await {
        let frame = frame?;
        let overflow = match frame.data_ref() {
            Some(data) => {
                len += data.len();
                len > limit
            }
            None => true,
        };
        frames.push_back(frame);
        if overflow {
            return Ok(Captured::Passthrough(Body::new(Replay { frames, rest: body })));
        }
    }

    if frames.len() == 1 {
        if let Some(Ok(data)) = frames.pop_front().map(Frame::into_data) {
            return Ok(Captured::Complete(data));
        }
    }

    let mut buf = Vec::with_capacity(len);
    for frame in frames {
        if let Ok(data) = frame.into_data() {
            buf.extend_from_slice(&data);
        }
    }
    Ok(Captured::Complete(Bytes::from(buf)))
}

/// Frames already pulled off a body, followed by whatever is left of it.
struct Replay {
    frames: VecDeque<Frame<Bytes>>,
    rest: Body,
}

impl Replay {
    fn buffered(&self) -> u64 {
        self.frames
            .iter()
            .filter_map(Frame::data_ref)
            .map(|d| d.len() as u64)
            .sum()
    }
}

impl HttpBody for Replay {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        match this.frames.pop_front() {
            Some(frame) => Poll::Ready(Some(Ok(frame))),
            None => Pin::new(&mut this.rest).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.frames.is_empty() && self.rest.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let buffered = self.buffered();
        let rest = self.rest.size_hint();
        let mut hint = SizeHint::new();
        if let Some(upper) = rest.upper() {
            hint.set_upper(upper + buffered);
        }
        hint.set_lower(rest.lower() + buffered);
        hint
    }
}
