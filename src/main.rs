//! HTTP server with request/response traffic logging.
//!
//! ```text
//!     Client ──▶ middleware ──▶ handler ──▶ LoggingClient ──▶ Upstream
//!                   │                            │
//!          In Request / In Response     Out Request / Out Response
//!                   │                            │
//!                   └──────────▶ TrafficLogger ◀─┘
//!                                     │
//!                               traffic log file
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use http_traffic_log::config::{load_config, ServerConfig};
use http_traffic_log::observability::init_logging;
use http_traffic_log::{HttpServer, Shutdown, TrafficLogger};

#[derive(Parser)]
#[command(name = "traffic-log-server")]
#[command(about = "HTTP server that records request/response traffic", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!("traffic-log-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        traffic_log_enabled = config.traffic_log.enabled,
        upstream = ?config.upstream.url,
        "Configuration loaded"
    );

    // Fail fast: a traffic log that was asked for but cannot be opened
    // aborts startup rather than running silently without it.
    let logger = Arc::new(TrafficLogger::new(config.traffic_log.clone())?);

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            logger.close();
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config, logger);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
