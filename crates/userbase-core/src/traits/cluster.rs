//! Store cluster trait.

use async_trait::async_trait;

use crate::Result;

use super::StoreClient;

/// A store that clients can connect to.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Client type produced by this cluster.
    type Client: StoreClient;

    /// Returns a human-readable description of the contact point.
    fn describe(&self) -> String;

    /// Open a client bound to the configured keyspace.
    async fn connect(&self) -> Result<Self::Client>;
}
