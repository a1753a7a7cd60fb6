//! Store connection settings.

use serde::{Deserialize, Serialize};

use crate::types::{Keyspace, StoreUrl};

/// Data center name used when none is configured.
pub const DEFAULT_DATA_CENTER: &str = "datacenter1";

fn default_data_center() -> String {
    DEFAULT_DATA_CENTER.to_string()
}

/// Where the store lives and which keyspace to bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub url: StoreUrl,
    pub keyspace: Keyspace,
    #[serde(default = "default_data_center")]
    pub local_data_center: String,
}

impl StoreConfig {
    pub fn new(url: StoreUrl, keyspace: Keyspace) -> Self {
        Self {
            url,
            keyspace,
            local_data_center: default_data_center(),
        }
    }

    pub fn with_data_center(mut self, name: impl Into<String>) -> Self {
        self.local_data_center = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_default_data_center() {
        let config: StoreConfig = serde_json::from_str(
            r#"{"url": "file:///var/lib/userbase", "keyspace": "userbase"}"#,
        )
        .unwrap();
        assert_eq!(config.local_data_center, DEFAULT_DATA_CENTER);
        assert_eq!(config.keyspace.as_str(), "userbase");
    }

    #[test]
    fn rejects_invalid_keyspace() {
        let result: Result<StoreConfig, _> = serde_json::from_str(
            r#"{"url": "file:///tmp/x", "keyspace": "1bad-name"}"#,
        );
        assert!(result.is_err());
    }
}
