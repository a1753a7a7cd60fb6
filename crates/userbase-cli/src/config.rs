//! Store settings resolution.
//!
//! Each setting comes from the first source that has it: command-line flag,
//! environment variable, `--config` file, built-in default.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use directories::ProjectDirs;
use serde::Deserialize;

use userbase_core::config::DEFAULT_DATA_CENTER;
use userbase_core::{Keyspace, StoreConfig, StoreUrl};

/// Keyspace used when none is configured.
pub const DEFAULT_KEYSPACE: &str = "userbase";

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Store URL (file:///path/to/store)
    #[arg(long, env = "USERBASE_STORE", global = true)]
    pub store: Option<String>,

    /// Keyspace to use
    #[arg(long, env = "USERBASE_KEYSPACE", global = true)]
    pub keyspace: Option<String>,

    /// Local data center name
    #[arg(long, env = "USERBASE_DATACENTER", global = true)]
    pub datacenter: Option<String>,

    /// JSON file with store settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Store settings as written in a config file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileSettings {
    url: Option<String>,
    keyspace: Option<String>,
    local_data_center: Option<String>,
}

fn load_file(path: &PathBuf) -> Result<FileSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn default_store_url() -> Result<StoreUrl> {
    let dirs = ProjectDirs::from("", "", "userbase")
        .context("Could not determine a data directory; pass --store")?;
    let dir = dirs.data_dir().join("store");
    StoreUrl::from_directory(&dir).context("Invalid default store directory")
}

impl StoreArgs {
    /// Resolve the settings to connect with.
    pub fn resolve(&self) -> Result<StoreConfig> {
        let file = match &self.config {
            Some(path) => load_file(path)?,
            None => FileSettings::default(),
        };

        let url = match self.store.as_ref().or(file.url.as_ref()) {
            Some(url) => StoreUrl::new(url).context("Invalid store URL")?,
            None => default_store_url()?,
        };

        let keyspace = self
            .keyspace
            .as_deref()
            .or(file.keyspace.as_deref())
            .unwrap_or(DEFAULT_KEYSPACE);
        let keyspace = Keyspace::new(keyspace).context("Invalid keyspace")?;

        let data_center = self
            .datacenter
            .clone()
            .or(file.local_data_center)
            .unwrap_or_else(|| DEFAULT_DATA_CENTER.to_string());

        Ok(StoreConfig::new(url, keyspace).with_data_center(data_center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"url": "file:///srv/users", "keyspace": "fromfile", "localDataCenter": "dc9"}}"#
        )
        .unwrap();

        let args = StoreArgs {
            keyspace: Some("fromflag".to_string()),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.url.as_str(), "file:///srv/users");
        assert_eq!(config.keyspace.as_str(), "fromflag");
        assert_eq!(config.local_data_center, "dc9");
    }

    #[test]
    fn defaults_apply() {
        let args = StoreArgs {
            store: Some("file:///srv/users".to_string()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.keyspace.as_str(), DEFAULT_KEYSPACE);
        assert_eq!(config.local_data_center, DEFAULT_DATA_CENTER);
    }

    #[test]
    fn rejects_remote_store() {
        let args = StoreArgs {
            store: Some("https://db.example.com".to_string()),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn rejects_unknown_config_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hosts": ["10.0.0.1"]}}"#).unwrap();
        let args = StoreArgs {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
