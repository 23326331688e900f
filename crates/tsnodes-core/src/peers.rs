//! Peer list derivation
//!
//! Walks an Endpoints listing and collects every address that exposes the
//! Typesense peering port. The API port is injected from configuration and
//! never read from the snapshot - subsets only advertise the ports a pod
//! actually serves, and the nodes file always pairs peering and API ports.

use k8s_openapi::api::core::v1::Endpoints;
use std::fmt;
use tracing::debug;

/// One cluster member as written to the nodes file: `address:peerPort:apiPort`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    /// Pod IP reported by the endpoint subset.
    pub address: String,
    /// Configured Typesense peering port.
    pub peer_port: u16,
    /// Configured Typesense API port.
    pub api_port: u16,
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.peer_port, self.api_port)
    }
}

/// Ordered peer entries, rendered as a single comma-joined line.
///
/// Order follows the iteration order of the source listing. No ordering is
/// guaranteed across reconciliation cycles beyond what the API server returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerList {
    entries: Vec<PeerEntry>,
}

impl PeerList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PeerEntry] {
        &self.entries
    }
}

impl fmt::Display for PeerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Outcome of one derivation round.
///
/// `Empty` means the snapshot was observed and nothing matched. A failed
/// listing never reaches the deriver, so the two cases stay distinguishable
/// for callers that want to log or alert on them differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derived {
    /// At least one address exposed the peering port.
    Peers(PeerList),
    /// Snapshot observed, no address matched the peering port.
    Empty,
}

/// Derive the peer list from an Endpoints listing.
///
/// Only records whose name equals `service` are considered. For every
/// subset address, an entry is emitted when the subset advertises a port
/// equal to `peer_port`; other ports (e.g. a metrics exporter sidecar) are
/// skipped.
pub fn derive_peer_list(
    items: &[Endpoints],
    service: &str,
    peer_port: u16,
    api_port: u16,
) -> Derived {
    let mut entries = Vec::new();

    for record in items {
        if record.metadata.name.as_deref() != Some(service) {
            continue;
        }

        for subset in record.subsets.as_deref().unwrap_or_default() {
            for address in subset.addresses.as_deref().unwrap_or_default() {
                debug!(ip = %address.ip, "handling endpoint address");

                for port in subset.ports.as_deref().unwrap_or_default() {
                    if port.port == i32::from(peer_port) {
                        entries.push(PeerEntry {
                            address: address.ip.clone(),
                            peer_port,
                            api_port,
                        });
                    } else {
                        debug!(
                            ip = %address.ip,
                            port = port.port,
                            peer_port = peer_port,
                            "port does not match peering port, skipping"
                        );
                    }
                }
            }
        }
    }

    if entries.is_empty() {
        Derived::Empty
    } else {
        Derived::Peers(PeerList { entries })
    }
}
