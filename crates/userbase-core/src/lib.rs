//! userbase-core - Query, pagination and repository layer for a
//! wide-column user store.
//!
//! The core translates structured filters into store predicates, carries
//! the store's native paging state to callers as an opaque token, and maps
//! rows to [`User`] entities. Backends implement [`StoreClient`] and
//! [`Cluster`].

pub mod config;
pub mod cursor;
pub mod datasource;
pub mod error;
pub mod mapping;
pub mod model;
pub mod query;
pub mod repo;
pub mod schema;
pub mod traits;
pub mod types;
pub mod value;

pub use config::StoreConfig;
pub use cursor::PageToken;
pub use datasource::{Datasource, TableMapper};
pub use error::Error;
pub use model::{NewUser, Patch, User, UserPatch};
pub use query::Filter;
pub use repo::{Page, UserRepository};
pub use traits::{Cluster, PagingState, QueryOptions, ResultPage, StoreClient};
pub use types::{Keyspace, StoreUrl, UserId};
pub use value::{CqlType, CqlValue, Row};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
