//! Shutdown coordination.
//!
//! Triggering ends `HttpServer::run`, which then closes the traffic log,
//! so every block written before the signal is flushed to disk.

use std::future::Future;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast coordinator for graceful shutdown.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger shutdown once `signal` resolves.
    ///
    /// The spawned task keeps the channel open, so subscribers never see a
    /// spurious close while it is waiting.
    pub fn trigger_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            signal.await;
            tracing::info!("Shutdown requested");
            let _ = tx.send(());
        })
    }

    /// Trigger shutdown on Ctrl+C.
    ///
    /// If the handler cannot be installed the error is logged and the
    /// server runs until stopped some other way.
    pub fn trigger_on_ctrl_c(&self) -> JoinHandle<()> {
        self.trigger_on(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
