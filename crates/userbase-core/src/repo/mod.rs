//! Repository operations.
//!
//! [`UserRepository`] ties the predicate builder, cursor codec and row
//! mapper to a connected [`StoreClient`](crate::traits::StoreClient).

mod page;
mod users;

pub use page::Page;
pub use users::UserRepository;
