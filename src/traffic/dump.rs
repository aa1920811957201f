//! Wire-text rendering of HTTP transactions.
//!
//! # Responsibilities
//! - Render requests and responses the way they appear on an HTTP/1.x wire
//! - Include the payload only when body logging is on
//! - Synthesize a response dump from pre-flattened parts (status, headers, body)
//!
//! # Design Decisions
//! - Header names of request/response objects are rendered in canonical
//!   `Title-Case`, as on the wire; flattened header keys are written verbatim
//! - Only buffered bodies can be dumped; live streams are rejected rather than consumed
//! - Synthesized responses list headers sorted by name so output is reproducible

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, Response, StatusCode, Uri, Version};

use crate::traffic::error::DumpError;

/// Body types that can be read synchronously for a dump without consuming them.
pub trait WireBody {
    /// Bytes of the payload as they would be sent.
    fn wire_bytes(&self) -> Result<&[u8], DumpError>;
}

impl WireBody for Bytes {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Ok(self.as_ref())
    }
}

impl WireBody for Vec<u8> {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Ok(self.as_slice())
    }
}

impl WireBody for String {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Ok(self.as_bytes())
    }
}

impl WireBody for &str {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Ok(self.as_bytes())
    }
}

impl WireBody for () {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Ok(&[])
    }
}

impl WireBody for Body {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Err(DumpError::UnbufferedBody)
    }
}

impl WireBody for hyper::body::Incoming {
    fn wire_bytes(&self) -> Result<&[u8], DumpError> {
        Err(DumpError::UnbufferedBody)
    }
}

/// Headers the request dump writes itself or never forwards verbatim.
fn skipped_request_header(name: &header::HeaderName) -> bool {
    *name == header::HOST || *name == header::TRANSFER_ENCODING || *name == header::TRAILER
}

/// `content-type` → `Content-Type`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

fn host_of(headers: &HeaderMap, uri: &Uri) -> Option<Vec<u8>> {
    if let Some(host) = headers.get(header::HOST) {
        return Some(host.as_bytes().to_vec());
    }
    uri.authority().map(|a| a.as_str().as_bytes().to_vec())
}

fn push_header(out: &mut Vec<u8>, name: &str, value: &[u8], eol: &[u8]) {
    out.extend_from_slice(canonical_name(name).as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value);
    out.extend_from_slice(eol);
}

fn push_request_headers(out: &mut Vec<u8>, headers: &HeaderMap) {
    for (name, value) in headers.iter().filter(|(n, _)| !skipped_request_header(n)) {
        push_header(out, name.as_str(), value.as_bytes(), b"\r\n");
    }
}

fn push_body<B: WireBody>(out: &mut Vec<u8>, body: &B, include_body: bool) -> Result<(), DumpError> {
    out.extend_from_slice(b"\r\n");
    if include_body {
        out.extend_from_slice(body.wire_bytes()?);
    }
    Ok(())
}

/// Dump a request as this server received it.
///
/// The request target is written as received (origin or absolute form).
/// A missing host is tolerated: the `Host` line is simply omitted.
pub fn inbound_request<B: WireBody>(req: &Request<B>, include_body: bool) -> Result<Vec<u8>, DumpError> {
    let mut out = Vec::with_capacity(256);
    let line = format!("{} {} {}\r\n", req.method(), req.uri(), version_str(req.version()));
    out.extend_from_slice(line.as_bytes());

    if let Some(host) = host_of(req.headers(), req.uri()) {
        push_header(&mut out, "host", &host, b"\r\n");
    }
    push_request_headers(&mut out, req.headers());
    push_body(&mut out, req.body(), include_body)?;
    Ok(out)
}

/// Dump a request as it will be sent by the client.
///
/// The request line uses origin form; the host moves to the `Host` header.
pub fn outbound_request<B: WireBody>(req: &Request<B>, include_body: bool) -> Result<Vec<u8>, DumpError> {
    let host = host_of(req.headers(), req.uri())
        .ok_or_else(|| DumpError::MissingHost(req.uri().to_string()))?;

    let target = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let mut out = Vec::with_capacity(256);
    let line = format!("{} {} {}\r\n", req.method(), target, version_str(req.version()));
    out.extend_from_slice(line.as_bytes());
    push_header(&mut out, "host", &host, b"\r\n");
    push_request_headers(&mut out, req.headers());
    push_body(&mut out, req.body(), include_body)?;
    Ok(out)
}

/// Dump a response object: status line, headers, optional body.
pub fn response<B: WireBody>(resp: &Response<B>, include_body: bool) -> Result<Vec<u8>, DumpError> {
    let mut out = Vec::with_capacity(256);
    let status = resp.status().as_u16();
    let line = format!("{} {} {}\r\n", version_str(resp.version()), status, reason_phrase(status));
    out.extend_from_slice(line.as_bytes());
    for (name, value) in resp.headers() {
        push_header(&mut out, name.as_str(), value.as_bytes(), b"\r\n");
    }
    push_body(&mut out, resp.body(), include_body)?;
    Ok(out)
}

/// Synthesize a response dump from parts that are already flattened.
///
/// Layout: `HTTP <code> <reason>`, one `key: value` line per entry sorted
/// by name (keys written exactly as supplied), then a blank line and the raw body when `include_body` is set
/// and the body is non-empty. Unknown status codes get an empty reason.
pub fn flattened_response<I, K, V>(headers: I, body: &[u8], status: u16, include_body: bool) -> Vec<u8>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let mut out = Vec::with_capacity(128 + body.len());
    out.extend_from_slice(format!("HTTP {} {}\n", status, reason_phrase(status)).as_bytes());

    let mut entries: Vec<(K, V)> = headers.into_iter().collect();
    entries.sort_by_cached_key(|(k, _)| k.as_ref().to_ascii_lowercase());
    for (name, value) in &entries {
        out.extend_from_slice(name.as_ref().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_ref());
        out.push(b'\n');
    }

    if include_body && !body.is_empty() {
        out.push(b'\n');
        out.extend_from_slice(body);
    }
    out
}
