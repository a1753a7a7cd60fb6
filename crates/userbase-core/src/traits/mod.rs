//! Core traits for the connected store.

mod client;
mod cluster;

pub use client::{PagingState, QueryOptions, ResultPage, StoreClient};
pub use cluster::Cluster;
