//! Abstract filter expressions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, InvalidInputError};

/// A filter over entity fields, with an optional page size.
///
/// ```json
/// {"where": {"name": "A", "age": {"gte": 18}}, "limit": 10}
/// ```
///
/// Entries under `where` are AND-ed together in the order given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Map<String, JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition on a field.
    pub fn where_eq(mut self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.where_clause
            .get_or_insert_with(Map::new)
            .insert(field.to_string(), value.into());
        self
    }

    /// Add an operator condition, e.g. `("age", "gte", 18)`.
    pub fn where_op(mut self, field: &str, op: &str, value: impl Into<JsonValue>) -> Self {
        let mut operand = Map::new();
        operand.insert(op.to_string(), value.into());
        self.where_clause
            .get_or_insert_with(Map::new)
            .insert(field.to_string(), JsonValue::Object(operand));
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The validated page size.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::Limit`] for a limit of zero.
    pub fn page_size(&self) -> Result<Option<u32>, Error> {
        match self.limit {
            None => Ok(None),
            Some(0) => Err(InvalidInputError::Limit { value: 0 }.into()),
            Some(n) => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
        }
    }
}
