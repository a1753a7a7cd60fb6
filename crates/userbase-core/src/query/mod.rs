//! Filter translation.

mod filter;
mod predicate;
pub mod statement;

pub use filter::Filter;
pub use predicate::{ALLOW_FILTERING, Condition, Operator, Predicate, PredicateBuilder};
