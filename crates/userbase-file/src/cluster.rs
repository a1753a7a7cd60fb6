//! File-backed cluster.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use userbase_core::config::DEFAULT_DATA_CENTER;
use userbase_core::error::{InvalidInputError, UnavailableError};
use userbase_core::traits::Cluster;
use userbase_core::{Keyspace, Result, StoreConfig};

use crate::client::FileClient;
use crate::store::FileStore;

/// A store rooted at a local directory.
///
/// Connecting creates the keyspace directory if needed.
#[derive(Debug, Clone)]
pub struct FileCluster {
    root: PathBuf,
    keyspace: Keyspace,
    data_center: String,
}

impl FileCluster {
    pub fn new(root: impl AsRef<Path>, keyspace: Keyspace) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            keyspace,
            data_center: DEFAULT_DATA_CENTER.to_string(),
        }
    }

    pub fn with_data_center(mut self, name: impl Into<String>) -> Self {
        self.data_center = name.into();
        self
    }

    /// Build a cluster from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if the URL has no local path.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let root = config
            .url
            .to_file_path()
            .ok_or_else(|| InvalidInputError::StoreUrl {
                value: config.url.to_string(),
                reason: "not a local directory".to_string(),
            })?;
        Ok(Self::new(root, config.keyspace.clone()).with_data_center(&config.local_data_center))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Cluster for FileCluster {
    type Client = FileClient;

    fn describe(&self) -> String {
        format!("file://{} ({})", self.root.display(), self.data_center)
    }

    #[instrument(skip(self), fields(keyspace = %self.keyspace))]
    async fn connect(&self) -> Result<FileClient> {
        let store = FileStore::new(&self.root);
        store
            .create_keyspace(self.keyspace.as_str())
            .map_err(|e| UnavailableError::Connection {
                message: format!("{}: {}", self.root.display(), e),
            })?;
        debug!(root = %self.root.display(), "Opened file store");

        Ok(FileClient::new(
            store,
            self.keyspace.clone(),
            self.data_center.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use userbase_core::StoreClient;
    use userbase_core::StoreUrl;

    #[tokio::test]
    async fn connect_creates_keyspace_dir() {
        let dir = TempDir::new().unwrap();
        let cluster = FileCluster::new(dir.path(), Keyspace::new("ks").unwrap());

        let client = cluster.connect().await.unwrap();
        assert!(dir.path().join("ks").is_dir());
        assert_eq!(client.keyspace(), "ks");
        assert_eq!(client.data_center(), DEFAULT_DATA_CENTER);
    }

    #[test]
    fn from_config_uses_url_path() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(
            StoreUrl::from_directory(dir.path()).unwrap(),
            Keyspace::new("ks").unwrap(),
        )
        .with_data_center("dc2");

        let cluster = FileCluster::from_config(&config).unwrap();
        assert_eq!(cluster.root(), dir.path());
        assert!(cluster.describe().contains("dc2"));
    }
}
