//! Endpoint snapshot source
//!
//! Wraps the namespaced Endpoints API behind a small capability trait so
//! the reconciler can be driven by a scripted source in tests.

use anyhow::{Context as _, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Endpoints;
use kube::api::{Api, ListParams, WatchEvent, WatchParams};
use kube::Client;

/// Raw change-event stream for the namespace's Endpoints.
pub type EventStream = BoxStream<'static, kube::Result<WatchEvent<Endpoints>>>;

/// Capability object for observing the namespace's Endpoints.
///
/// Both operations are fallible, latency-bearing calls against the cluster
/// API; failures are reported to the caller and must never panic.
#[allow(async_fn_in_trait)]
pub trait EndpointSource {
    /// Point-in-time listing of all Endpoints in the namespace.
    async fn list(&self) -> Result<Vec<Endpoints>>;

    /// Open a continuous change-event subscription.
    async fn watch(&self) -> Result<EventStream>;
}

/// Live source backed by the cluster API.
pub struct KubeEndpoints {
    api: Api<Endpoints>,
}

impl KubeEndpoints {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }
}

impl EndpointSource for KubeEndpoints {
    async fn list(&self) -> Result<Vec<Endpoints>> {
        let listing = self
            .api
            .list(&ListParams::default())
            .await
            .context("failed to list endpoints")?;
        Ok(listing.items)
    }

    async fn watch(&self) -> Result<EventStream> {
        let stream = self
            .api
            .watch(&WatchParams::default(), "0")
            .await
            .context("failed to open endpoints watch")?;
        Ok(stream.boxed())
    }
}
