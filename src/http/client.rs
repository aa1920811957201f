//! Outbound HTTP client with traffic logging.
//!
//! # Responsibilities
//! - Log each request before it is sent (Out Request)
//! - Send it through the pooled hyper client
//! - Log the upstream response under the same ID (Out Response), buffering
//!   its body only when that block will include it and it fits the limit

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::body::{capture, Captured};
use crate::traffic::{Direction, Kind, TrafficLogger, TransactionId};

/// Errors from an upstream call. Logging failures are never among them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response body: {0}")]
    Body(#[from] axum::Error),
}

/// HTTP client that records every exchange in the traffic log.
#[derive(Clone)]
pub struct LoggingClient {
    client: Client<HttpConnector, Body>,
    logger: Arc<TrafficLogger>,
    max_body_bytes: usize,
}

impl LoggingClient {
    /// Create a client sharing `logger` with the rest of the server.
    pub fn new(logger: Arc<TrafficLogger>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let max_body_bytes = logger.config().max_body_bytes;
        Self {
            client,
            logger,
            max_body_bytes,
        }
    }

    /// Send `req` (absolute URI) and return the upstream response.
    ///
    /// Returns the transaction ID alongside the response so callers can
    /// correlate it with their own logs. The response body is never
    /// limited: anything the log cannot hold streams through untouched.
    pub async fn send(&self, req: Request<Bytes>) -> Result<(TransactionId, Response<Body>), ClientError> {
        let result = self.logger.log_outbound_request(&req);
        let id = self.logger.id_from(result);

        tracing::debug!(transaction_id = %id, method = %req.method(), uri = %req.uri(), "Sending upstream request");

        let (parts, body) = req.into_parts();
        let response = self.client.request(Request::from_parts(parts, Body::from(body))).await?;
        let (parts, body) = response.into_parts();
        let body = Body::new(body);

        let wants_body =
            self.logger.config().include_body && self.logger.is_logging(Direction::Outbound, Kind::Response);
        if !wants_body {
            return Ok((id, self.log_head(parts, body, id)));
        }

        // Failures below were already reported by the logger.
        match capture(body, self.max_body_bytes).await? {
            Captured::Complete(bytes) => {
                let response = Response::from_parts(parts, bytes);
                let _ = self.logger.log_outbound_response(&response, id);
                let (parts, bytes) = response.into_parts();
                Ok((id, Response::from_parts(parts, Body::from(bytes))))
            }
            Captured::Passthrough(body) => {
                tracing::warn!(transaction_id = %id, limit = self.max_body_bytes, "Upstream response body not captured for traffic log");
                Ok((id, self.log_head(parts, body, id)))
            }
        }
    }

    /// Log the response without its payload and reassemble it.
    fn log_head(&self, parts: axum::http::response::Parts, body: Body, id: TransactionId) -> Response<Body> {
        let head = Response::from_parts(parts, ());
        let _ = self.logger.log_outbound_response(&head, id);
        let (parts, ()) = head.into_parts();
        Response::from_parts(parts, body)
    }
}
