//! tsnodes sidecar library
//!
//! Watches the Endpoints of a Typesense service and republishes peer
//! membership to the nodes file Typesense reads on startup and on
//! topology change.

pub mod config;
pub mod endpoints;
pub mod publish;
pub mod reconciler;
pub mod shutdown;
