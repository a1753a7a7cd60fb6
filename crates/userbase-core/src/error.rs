//! Error types for userbase.
//!
//! This module provides a unified error type with explicit variants for
//! store availability, missing entities, store-side query failures and
//! caller input errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for userbase operations.
///
/// Callers can match on the variant to tell a missing entity apart from
/// an unreachable store or a rejected filter.
#[derive(Debug, Error)]
pub enum Error {
    /// The store client is not connected, was shut down, or is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] UnavailableError),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// The store rejected a query or returned something unexpected.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Caller-supplied input was rejected before reaching the store.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if this error reports an unavailable store.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

/// Store availability errors.
#[derive(Debug, Error)]
pub enum UnavailableError {
    /// The client has been shut down.
    #[error("client for keyspace '{keyspace}' is shut down")]
    Closed { keyspace: String },

    /// Connecting to the store failed.
    #[error("connection failed: {message}")]
    Connection { message: String },
}

/// A lookup by primary key found no row.
#[derive(Debug)]
pub struct NotFoundError {
    /// Name of the entity type (e.g. "User").
    pub entity: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}

impl NotFoundError {
    /// Create a new not-found error.
    pub fn new(entity: &'static str, id: impl Into<String>) -> Self {
        Self {
            entity,
            id: id.into(),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with id '{}'", self.entity, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Store-side query errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An aggregate query returned no row at all.
    #[error("aggregate query returned no rows: {query}")]
    AggregateEmpty { query: String },

    /// A row did not contain a required column.
    #[error("row is missing column '{column}'")]
    MissingColumn { column: String },

    /// A value did not have the type the column requires.
    #[error("column '{column}' expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// The query text could not be parsed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// The query referenced a table that does not exist.
    #[error("unknown table '{keyspace}.{table}'")]
    UnknownTable { keyspace: String, table: String },

    /// Filtering on a non-key column without ALLOW FILTERING.
    #[error(
        "cannot filter on column '{column}' without ALLOW FILTERING; \
         this query may scan the whole table"
    )]
    FilteringRequired { column: String },

    /// The store could not interpret a paging state.
    #[error("invalid paging state: {reason}")]
    InvalidPagingState { reason: String },

    /// The number of bound parameters does not match the query.
    #[error("query expects {expected} parameters, {found} were bound")]
    ParameterCount { expected: usize, found: usize },

    /// Storage-level I/O failure.
    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A pagination token is not a canonical token of this codec version.
    #[error("invalid page state token: {reason}")]
    Cursor { reason: String },

    /// A filter used an operator this layer does not translate.
    #[error("unsupported filter operator '{operator}'")]
    UnsupportedOperator { operator: String },

    /// A filter named a field the entity does not have.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// A filter value could not be converted to the column type.
    #[error("invalid value for '{field}': {reason}")]
    FilterValue { field: String, reason: String },

    /// A page size outside the accepted range.
    #[error("invalid limit {value}: must be at least 1")]
    Limit { value: u64 },

    /// An entity field failed a presence check.
    #[error("invalid field '{field}': {reason}")]
    Field { field: String, reason: String },

    /// An identifier that is not a valid user id.
    #[error("invalid user id '{value}': {reason}")]
    UserId { value: String, reason: String },

    /// Invalid store URL.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// Invalid keyspace name.
    #[error("invalid keyspace '{value}': {reason}")]
    Keyspace { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
