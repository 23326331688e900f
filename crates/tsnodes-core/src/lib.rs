//! Core peer-list types for tsnodes
//!
//! This crate contains the pure model: turning a listing of Kubernetes
//! Endpoints into the comma-joined node string Typesense reads on startup.
//! It has no client or filesystem dependencies so the derivation can be
//! exercised directly in tests.

mod peers;

pub use peers::{derive_peer_list, Derived, PeerEntry, PeerList};
