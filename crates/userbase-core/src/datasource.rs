//! Store connection lifecycle.
//!
//! A [`Datasource`] owns the single shared client: it connects once in
//! [`Datasource::init`], lends out `Arc` handles, and shuts the client down
//! once in [`Datasource::stop`]. Handles still held after `stop` fail every
//! call with a store-unavailable error.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::Result;
use crate::traits::{Cluster, StoreClient};
use crate::value::{CqlValue, Row};

/// Owner of the connected store client.
#[derive(Debug)]
pub struct Datasource<C: StoreClient> {
    client: Arc<C>,
    contact: String,
}

impl<C: StoreClient> Datasource<C> {
    /// Connect to the cluster.
    ///
    /// # Errors
    ///
    /// Returns an unavailable error if the cluster cannot be reached.
    #[instrument(skip(cluster), fields(contact = %cluster.describe()))]
    pub async fn init<K>(cluster: &K) -> Result<Self>
    where
        K: Cluster<Client = C>,
    {
        let client = cluster.connect().await?;
        info!(keyspace = client.keyspace(), "Connected to store");
        Ok(Self {
            client: Arc::new(client),
            contact: cluster.describe(),
        })
    }

    /// The shared client handle.
    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// A row helper bound to one table.
    pub fn table(&self, name: &str) -> TableMapper<C> {
        TableMapper::new(self.client(), name)
    }

    /// Shut the client down.
    ///
    /// # Errors
    ///
    /// Propagates a failure from the client's shutdown.
    #[instrument(skip(self), fields(contact = %self.contact))]
    pub async fn stop(self) -> Result<()> {
        self.client.shutdown().await?;
        info!("Store client shut down");
        Ok(())
    }
}

/// Row-level operations bound to a table name.
#[derive(Debug)]
pub struct TableMapper<C: StoreClient> {
    client: Arc<C>,
    table: String,
}

impl<C: StoreClient> Clone for TableMapper<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            table: self.table.clone(),
        }
    }
}

impl<C: StoreClient> TableMapper<C> {
    pub fn new(client: Arc<C>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub async fn get(&self, key: &CqlValue) -> Result<Option<Row>> {
        self.client.get_row(&self.table, key).await
    }

    pub async fn insert(&self, row: &Row) -> Result<()> {
        self.client.insert_row(&self.table, row).await
    }

    pub async fn update(&self, row: &Row) -> Result<()> {
        self.client.update_row(&self.table, row).await
    }

    pub async fn remove(&self, key: &CqlValue) -> Result<()> {
        self.client.remove_row(&self.table, key).await
    }
}
