//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, traffic log)
//! - Forward `/upstream/*` requests through the logging client
//! - Close the traffic log on every exit path

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::client::LoggingClient;
use crate::http::middleware::traffic_log_middleware;
use crate::traffic::TrafficLogger;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub logger: Arc<TrafficLogger>,
    pub client: LoggingClient,
    pub upstream: Option<String>,
}

/// HTTP server hosting the traffic logger.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    logger: Arc<TrafficLogger>,
}

impl HttpServer {
    /// Create a new HTTP server around an already constructed logger.
    pub fn new(config: ServerConfig, logger: Arc<TrafficLogger>) -> Self {
        let state = AppState {
            logger: logger.clone(),
            client: LoggingClient::new(logger.clone()),
            upstream: config.upstream.url.as_ref().map(|u| u.trim_end_matches('/').to_string()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config, logger }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/echo", any(echo_handler))
            .route("/upstream/{*path}", any(upstream_handler))
            // Timeouts resolve inside the traffic middleware: the 408 is
            // logged under the request's ID.
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(state.logger.clone(), traffic_log_middleware))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then close the traffic log.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        self.logger.close();

        match &result {
            Ok(()) => tracing::info!("HTTP server stopped"),
            Err(e) => tracing::error!(error = %e, "HTTP server failed"),
        }
        result
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared traffic logger.
    pub fn logger(&self) -> &Arc<TrafficLogger> {
        &self.logger
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Echo the request body back with the caller's content type.
async fn echo_handler(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Forward to the configured upstream through the logging client.
async fn upstream_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(base) = state.upstream.as_deref() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "No upstream configured").into_response();
    };

    let target = match uri.query() {
        Some(q) => format!("{base}/{path}?{q}"),
        None => format!("{base}/{path}"),
    };

    let mut builder = Request::builder().method(method).uri(&target);
    if let Some(h) = builder.headers_mut() {
        for (name, value) in headers.iter().filter(|(n, _)| **n != header::HOST) {
            h.append(name.clone(), value.clone());
        }
    }
    let req = match builder.body(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(target = %target, error = %e, "Invalid upstream request");
            return (StatusCode::BAD_REQUEST, "Invalid upstream request").into_response();
        }
    };

    match state.client.send(req).await {
        Ok((_, response)) => {
            let (mut parts, body) = response.into_parts();
            parts.headers.remove(header::TRANSFER_ENCODING);
            parts.headers.remove(header::CONNECTION);
            Response::from_parts(parts, body)
        }
        Err(e) => {
            tracing::error!(target = %target, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
