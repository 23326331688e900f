//! tsnodes sidecar
//!
//! Publishes the peer membership of a Typesense service as the nodes file
//! the Typesense server reads on startup and on topology change.

use anyhow::Context as _;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tsnodes_sidecar::{
    config::Config, endpoints::KubeEndpoints, publish::NodesFile, reconciler::Reconciler, shutdown,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = Config::parse();

    let default_level = if config.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    info!(
        namespace = %config.namespace,
        service = %config.service,
        nodes_file = %config.nodes_file.display(),
        "Starting tsnodes sidecar"
    );

    let client = kube::Client::try_default()
        .await
        .context("failed to build kubernetes client")?;
    info!("Connected to Kubernetes");

    let source = KubeEndpoints::new(client, &config.namespace);
    let nodes_file = NodesFile::new(&config.nodes_file);
    let shutdown_rx = shutdown::subscribe().context("failed to install signal handlers")?;

    Reconciler::new(source, nodes_file, &config, shutdown_rx)
        .run()
        .await?;

    info!("tsnodes sidecar stopped");
    Ok(())
}
