//! Nodes file publisher
//!
//! Whole-file replacement: the payload is written to a temporary file in
//! the destination directory and renamed over the destination, so a
//! concurrent reader sees either the previous or the new content, never a
//! mixture of both.

use anyhow::{anyhow, Context as _, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Atomic whole-file publisher for the Typesense nodes file.
#[derive(Debug, Clone)]
pub struct NodesFile {
    path: PathBuf,
}

impl NodesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `payload`.
    pub async fn publish(&self, payload: &[u8]) -> Result<()> {
        let path = self.path.clone();
        let payload = payload.to_vec();

        tokio::task::spawn_blocking(move || replace_contents(&path, &payload))
            .await
            .context("nodes file writer task failed")?
    }
}

fn replace_contents(path: &Path, payload: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("nodes file path {} has no parent directory", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(payload)
        .context("failed to write nodes payload")?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    debug!(path = %path.display(), bytes = payload.len(), "nodes file replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_publish_writes_exact_bytes() {
        let dir = tempdir().unwrap();
        let file = NodesFile::new(dir.path().join("nodes"));

        file.publish(b"10.0.0.5:8107:8108").await.unwrap();

        let content = std::fs::read(file.path()).unwrap();
        assert_eq!(content, b"10.0.0.5:8107:8108");
    }

    #[tokio::test]
    async fn test_publish_replaces_wholesale() {
        let dir = tempdir().unwrap();
        let file = NodesFile::new(dir.path().join("nodes"));

        file.publish(b"10.0.0.5:8107:8108,10.0.0.6:8107:8108")
            .await
            .unwrap();
        file.publish(b"10.0.0.7:8107:8108").await.unwrap();

        let content = std::fs::read(file.path()).unwrap();
        assert_eq!(content, b"10.0.0.7:8107:8108");
    }

    #[tokio::test]
    async fn test_missing_parent_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let file = NodesFile::new(dir.path().join("missing").join("nodes"));

        assert!(file.publish(b"10.0.0.5:8107:8108").await.is_err());
        assert!(!file.path().exists());
    }
}
