//! Watch loop / reconciler
//!
//! Subscribes to Endpoints change events and re-derives and republishes
//! the nodes file on every Added/Modified/Deleted event. Long-lived watch
//! connections are severed by the platform routinely (timeouts, load
//! balancer resets), so stream closure is handled by a single
//! resubscription attempt; failure to resubscribe is terminal because the
//! sidecar can no longer track topology changes.

use crate::config::Config;
use crate::endpoints::{EndpointSource, EventStream};
use crate::publish::NodesFile;
use futures::StreamExt;
use kube::api::WatchEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tsnodes_core::{derive_peer_list, Derived};

/// Terminal reconciler failures. Everything else is logged and retried on
/// the next change event.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to open endpoints watch: {0}")]
    WatchOpen(#[source] anyhow::Error),
    #[error("endpoints watch lost and could not be re-established: {0}")]
    Resubscribe(#[source] anyhow::Error),
}

/// Watch loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Starting,
    Watching,
    Reconnecting,
    Stopped,
}

/// Outcome of a single fetch -> derive -> publish round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Peer list derived and written.
    Published { peers: usize },
    /// Snapshot observed, nothing matched the peering port; file untouched.
    NoPeers,
    /// Listing failed; file untouched.
    SnapshotUnavailable,
    /// Peer list derived but the write failed; the next event retries.
    WriteFailed,
}

pub struct Reconciler<S> {
    source: S,
    nodes_file: NodesFile,
    service: String,
    peer_port: u16,
    api_port: u16,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    state: LoopState,
}

impl<S: EndpointSource> Reconciler<S> {
    pub fn new(
        source: S,
        nodes_file: NodesFile,
        config: &Config,
        shutdown_rx: mpsc::UnboundedReceiver<()>,
    ) -> Self {
        Self {
            source,
            nodes_file,
            service: config.service.clone(),
            peer_port: config.peer_port,
            api_port: config.api_port,
            shutdown_rx,
            state: LoopState::Starting,
        }
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, "watch loop state change");
        self.state = next;
    }

    /// Run the watch loop until a stop signal or an irrecoverable stream
    /// loss.
    pub async fn run(mut self) -> Result<(), ReconcilerError> {
        // Initial reconciliation before the watch opens, so a freshly
        // scheduled pod gets a nodes file without waiting for the first
        // topology change.
        let outcome = self.reconcile().await;
        debug!(?outcome, "initial reconciliation finished");

        let mut stream = match self.source.watch().await {
            Ok(stream) => stream,
            Err(e) => {
                self.transition(LoopState::Stopped);
                return Err(ReconcilerError::WatchOpen(e));
            }
        };
        self.transition(LoopState::Watching);
        info!(service = %self.service, "watching endpoints for changes");

        loop {
            tokio::select! {
                // A stop request wins over buffered change events.
                biased;

                _ = self.shutdown_rx.recv() => {
                    info!("stop requested, exiting watch loop");
                    self.transition(LoopState::Stopped);
                    return Ok(());
                }

                event = stream.next() => match event {
                    Some(Ok(
                        WatchEvent::Added(_) | WatchEvent::Modified(_) | WatchEvent::Deleted(_),
                    )) => {
                        let outcome = self.reconcile().await;
                        debug!(?outcome, "reconciliation round finished");
                    }
                    Some(Ok(WatchEvent::Bookmark(_))) => {}
                    Some(Ok(WatchEvent::Error(e))) => {
                        warn!(error = %e, "endpoints watch reported an error event");
                        stream = self.resubscribe().await?;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "endpoints watch stream failed");
                        stream = self.resubscribe().await?;
                    }
                    None => {
                        stream = self.resubscribe().await?;
                    }
                },
            }
        }
    }

    /// Single resubscription attempt after the stream terminates.
    async fn resubscribe(&mut self) -> Result<EventStream, ReconcilerError> {
        self.transition(LoopState::Reconnecting);

        match self.source.watch().await {
            Ok(stream) => {
                info!("watch stream closed, reconnected, continuing");
                self.transition(LoopState::Watching);
                Ok(stream)
            }
            Err(e) => {
                error!(error = %e, "failed to re-establish endpoints watch");
                self.transition(LoopState::Stopped);
                Err(ReconcilerError::Resubscribe(e))
            }
        }
    }

    /// One fetch -> derive -> publish cycle.
    ///
    /// An empty or unavailable snapshot never overwrites a previously good
    /// nodes file: staleness is preferred over the cluster briefly
    /// believing it has zero peers during a transient listing hiccup.
    async fn reconcile(&self) -> RoundOutcome {
        let items = match self.source.list().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "failed to list endpoints, keeping previous nodes file");
                return RoundOutcome::SnapshotUnavailable;
            }
        };

        match derive_peer_list(&items, &self.service, self.peer_port, self.api_port) {
            Derived::Empty => {
                debug!(service = %self.service, "no peers matched, skipping write");
                RoundOutcome::NoPeers
            }
            Derived::Peers(list) => {
                let rendered = list.to_string();
                debug!(peers = list.len(), nodes = %rendered, "derived peer list");

                match self.nodes_file.publish(rendered.as_bytes()).await {
                    Ok(()) => {
                        info!(
                            peers = list.len(),
                            path = %self.nodes_file.path().display(),
                            "published nodes file"
                        );
                        RoundOutcome::Published { peers: list.len() }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to write nodes file");
                        RoundOutcome::WriteFailed
                    }
                }
            }
        }
    }
}
