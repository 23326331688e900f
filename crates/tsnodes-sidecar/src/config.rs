//! Sidecar configuration

use clap::Parser;
use std::path::PathBuf;

/// Command-line configuration for the tsnodes sidecar.
#[derive(Parser, Debug, Clone)]
#[command(name = "tsnodes")]
#[command(about = "Publishes Typesense peer membership from Kubernetes Endpoints")]
pub struct Config {
    /// The namespace that Typesense is installed within.
    #[arg(long, env = "TSNODES_NAMESPACE", default_value = "typesense")]
    pub namespace: String,

    /// The name of the Typesense service to use the endpoints of.
    #[arg(long, env = "TSNODES_SERVICE", default_value = "ts")]
    pub service: String,

    /// The location of the file to write node information to.
    #[arg(long, env = "TSNODES_NODES_FILE", default_value = "/usr/share/typesense/nodes")]
    pub nodes_file: PathBuf,

    /// Port on which the Typesense peering service listens.
    #[arg(long, default_value_t = 8107)]
    pub peer_port: u16,

    /// Port on which the Typesense API service listens.
    #[arg(long, default_value_t = 8108)]
    pub api_port: u16,

    /// Enable verbose logging.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["tsnodes"]).unwrap();
        assert_eq!(config.namespace, "typesense");
        assert_eq!(config.service, "ts");
        assert_eq!(
            config.nodes_file,
            PathBuf::from("/usr/share/typesense/nodes")
        );
        assert_eq!(config.peer_port, 8107);
        assert_eq!(config.api_port, 8108);
        assert!(!config.verbose);
    }

    #[test]
    fn test_flag_overrides() {
        let config = Config::try_parse_from([
            "tsnodes",
            "--namespace",
            "search",
            "--service",
            "typesense-svc",
            "--nodes-file",
            "/tmp/nodes",
            "--peer-port",
            "9107",
            "--api-port",
            "9108",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(config.namespace, "search");
        assert_eq!(config.service, "typesense-svc");
        assert_eq!(config.nodes_file, PathBuf::from("/tmp/nodes"));
        assert_eq!(config.peer_port, 9107);
        assert_eq!(config.api_port, 9108);
        assert!(config.verbose);
    }
}
