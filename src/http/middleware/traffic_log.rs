//! Inbound traffic logging middleware.
//!
//! Logs the request before the handler runs and the response after it,
//! both under one transaction ID. The ID is also placed in the request
//! extensions so handlers can correlate their own diagnostics.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{request, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::body::{capture, Captured};
use crate::traffic::dump::canonical_name;
use crate::traffic::{Direction, Kind, TrafficLogger, TransactionId};

/// Response headers as `Name: value` pairs in wire case.
fn flatten(headers: &HeaderMap) -> Vec<(String, &[u8])> {
    headers
        .iter()
        .map(|(name, value)| (canonical_name(name.as_str()), value.as_bytes()))
        .collect()
}

/// Log the request line and headers only, then reassemble the request.
fn log_request_head(logger: &TrafficLogger, parts: request::Parts, body: Body) -> (Request<Body>, TransactionId) {
    let head = Request::from_parts(parts, ());
    let result = logger.log_inbound_request(&head);
    let id = logger.id_from(result);
    let (parts, ()) = head.into_parts();
    (Request::from_parts(parts, body), id)
}

pub async fn traffic_log_middleware(
    State(logger): State<Arc<TrafficLogger>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let limit = logger.config().max_body_bytes;
    let with_body = logger.config().include_body;

    let (parts, body) = req.into_parts();
    let (mut req, id) = if with_body && logger.is_logging(Direction::Inbound, Kind::Request) {
        match capture(body, limit).await {
            Ok(Captured::Complete(bytes)) => {
                let buffered = Request::from_parts(parts, bytes);
                let result = logger.log_inbound_request(&buffered);
                let id = logger.id_from(result);
                let (parts, bytes) = buffered.into_parts();
                (Request::from_parts(parts, Body::from(bytes)), id)
            }
            Ok(Captured::Passthrough(body)) => {
                let (req, id) = log_request_head(&logger, parts, body);
                tracing::warn!(transaction_id = %id, limit, "Request body not captured for traffic log");
                (req, id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request body");
                return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
            }
        }
    } else {
        log_request_head(&logger, parts, body)
    };

    req.extensions_mut().insert(id);
    let response = next.run(req).await;

    if !logger.is_logging(Direction::Inbound, Kind::Response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let status = parts.status.as_u16();

    if !with_body {
        let _ = logger.log_inbound_response(flatten(&parts.headers), &[], status, id);
        return Response::from_parts(parts, body);
    }

    match capture(body, limit).await {
        Ok(Captured::Complete(bytes)) => {
            let _ = logger.log_inbound_response(flatten(&parts.headers), &bytes, status, id);
            Response::from_parts(parts, Body::from(bytes))
        }
        Ok(Captured::Passthrough(body)) => {
            tracing::warn!(transaction_id = %id, limit, "Response body not captured for traffic log");
            let _ = logger.log_inbound_response(flatten(&parts.headers), &[], status, id);
            Response::from_parts(parts, body)
        }
        Err(e) => {
            tracing::error!(transaction_id = %id, error = %e, "Failed to read response body");
            let _ = logger.log_inbound_response(flatten(&parts.headers), &[], status, id);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read response body").into_response()
        }
    }
}
