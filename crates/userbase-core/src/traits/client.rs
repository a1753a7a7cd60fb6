//! Connected store client trait.

use async_trait::async_trait;

use crate::Result;
use crate::schema::TableSchema;
use crate::value::{CqlValue, Row};

/// The store's native continuation cursor.
///
/// The bytes are produced and interpreted by the store only; this layer
/// never looks inside them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PagingState(Vec<u8>);

impl PagingState {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for PagingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PagingState({} bytes)", self.0.len())
    }
}

/// Per-query execution options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum number of rows to return in one page.
    pub fetch_size: Option<u32>,
    /// Resume a paged scan where a previous page left off.
    pub paging_state: Option<PagingState>,
    /// Ask the store to prepare (and cache) the statement.
    ///
    /// A hint only: stores without a statement cache may ignore it.
    pub prepare: bool,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub rows: Vec<Row>,
    /// Present when the store may have more rows for this query.
    pub paging_state: Option<PagingState>,
}

/// A connected store client.
///
/// One client is shared by every repository operation; implementations must
/// tolerate concurrent calls without external locking.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Returns the keyspace this client is bound to.
    fn keyspace(&self) -> &str;

    /// Returns false once the client has been shut down.
    fn is_open(&self) -> bool;

    /// Execute a query with positional parameters.
    async fn execute(
        &self,
        query: &str,
        params: &[CqlValue],
        options: &QueryOptions,
    ) -> Result<ResultPage>;

    /// Create the table if it does not already exist.
    async fn ensure_table(&self, schema: &TableSchema) -> Result<()>;

    /// Fetch a row by partition key.
    async fn get_row(&self, table: &str, key: &CqlValue) -> Result<Option<Row>>;

    /// Insert a row. The row must contain the partition key column.
    async fn insert_row(&self, table: &str, row: &Row) -> Result<()>;

    /// Write a row over an existing one. The row must contain the partition key column.
    async fn update_row(&self, table: &str, row: &Row) -> Result<()>;

    /// Remove a row by partition key. Removing a missing row is not an error.
    async fn remove_row(&self, table: &str, key: &CqlValue) -> Result<()>;

    /// Close the client. Subsequent calls fail with a store-unavailable error.
    async fn shutdown(&self) -> Result<()>;
}
