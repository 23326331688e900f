//! Shutdown coordinator
//!
//! Forwards SIGINT/SIGTERM to the reconciler over a channel so the current
//! reconciliation finishes instead of being interrupted mid-write. Repeated
//! signals while shutdown is in progress enqueue at most another stop
//! request and never double-close anything.

use anyhow::{Context as _, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::info;

/// Install the signal handlers and return the stop-request receiver.
pub fn subscribe() -> Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    info!(signal = "SIGINT", "received termination signal, stopping watcher");
                }
                _ = sigterm.recv() => {
                    info!(signal = "SIGTERM", "received termination signal, stopping watcher");
                }
            }

            if tx.send(()).is_err() {
                // Receiver gone: the reconciler already stopped.
                break;
            }
        }
    });

    Ok(rx)
}
