//! Core userbase types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod keyspace;
mod store_url;
mod user_id;

pub use keyspace::Keyspace;
pub use store_url::StoreUrl;
pub use user_id::UserId;
