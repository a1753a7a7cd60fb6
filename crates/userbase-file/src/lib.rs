//! userbase-file - Filesystem-backed wide-column store.
//!
//! Implements the `userbase-core` store contract over plain JSON files, for
//! local use and tests. It executes the subset of CQL the core emits, pages
//! in partition-token order, and enforces table schemas on writes.

mod client;
mod cluster;
mod cql;
mod paging;
mod store;

pub use client::{DEFAULT_FETCH_SIZE, FileClient};
pub use cluster::FileCluster;
pub use store::FileStore;
