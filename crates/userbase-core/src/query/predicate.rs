//! Predicate builder.
//!
//! Translates a [`Filter`] into a query fragment plus positional parameters.
//! Every condition becomes exactly one clause; nothing the caller wrote is
//! dropped. Conditions this layer cannot express are rejected.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, InvalidInputError};
use crate::mapping::{ColumnMap, FieldMapping, coerce_json};
use crate::value::CqlValue;

use super::Filter;

/// Directive permitting filters on columns that are not part of the key.
pub const ALLOW_FILTERING: &str = "ALLOW FILTERING";

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    /// Parse a filter operator keyword.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::UnsupportedOperator`] for keywords with
    /// no translation (`neq`, `like`, `nin`, `between`, ...).
    pub fn parse(keyword: &str) -> Result<Self, Error> {
        match keyword {
            "eq" => Ok(Operator::Eq),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "inq" => Ok(Operator::In),
            other => Err(unsupported(other)),
        }
    }

    pub fn as_cql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cql())
    }
}

/// One translated condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub op: Operator,
    pub values: Vec<CqlValue>,
}

impl Condition {
    fn render(&self) -> String {
        match self.op {
            Operator::In => {
                let marks = vec!["?"; self.values.len()].join(", ");
                format!("{} IN ({})", self.column, marks)
            }
            op => format!("{} {} ?", self.column, op),
        }
    }
}

/// A query fragment and its positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
    fragment: String,
    params: Vec<CqlValue>,
}

impl Predicate {
    /// The text to append after `SELECT ... FROM table`.
    ///
    /// Empty when there are no conditions; otherwise starts with a space.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn params(&self) -> &[CqlValue] {
        &self.params
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether the fragment carries the relaxed-indexing directive.
    pub fn allows_filtering(&self) -> bool {
        !self.conditions.is_empty()
    }
}

/// Builds predicates for one entity's columns.
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder {
    columns: ColumnMap,
}

impl PredicateBuilder {
    pub fn new(columns: ColumnMap) -> Self {
        Self { columns }
    }

    /// Build the predicate for a filter. An absent or empty filter yields an
    /// empty predicate (unfiltered scan).
    ///
    /// Any condition adds `ALLOW FILTERING`, since filtered fields are not
    /// presumed to be key columns. That trades a possible full scan for the
    /// ability to filter on any column.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] for unknown fields, `or`,
    /// untranslatable operators, and values that do not fit the column type.
    pub fn build(&self, filter: Option<&Filter>) -> Result<Predicate, Error> {
        let mut conditions = Vec::new();
        if let Some(where_clause) = filter.and_then(|f| f.where_clause.as_ref()) {
            self.collect(where_clause, &mut conditions)?;
        }

        if conditions.is_empty() {
            return Ok(Predicate::default());
        }

        let clauses: Vec<String> = conditions.iter().map(Condition::render).collect();
        let fragment = format!(" WHERE {} {}", clauses.join(" AND "), ALLOW_FILTERING);
        let params = conditions
            .iter()
            .flat_map(|c| c.values.iter().cloned())
            .collect();

        Ok(Predicate {
            conditions,
            fragment,
            params,
        })
    }

    fn collect(&self, map: &Map<String, JsonValue>, out: &mut Vec<Condition>) -> Result<(), Error> {
        for (key, value) in map {
            match key.as_str() {
                // A nested conjunction flattens into the enclosing one.
                "and" => {
                    let branches = value.as_array().ok_or_else(|| {
                        filter_value("and", "expected an array of conditions")
                    })?;
                    for branch in branches {
                        let branch = branch.as_object().ok_or_else(|| {
                            filter_value("and", "each branch must be an object")
                        })?;
                        self.collect(branch, out)?;
                    }
                }
                "or" => return Err(unsupported("or")),
                field => {
                    let mapping = self.columns.resolve(field).ok_or_else(|| {
                        InvalidInputError::UnknownField {
                            field: field.to_string(),
                        }
                    })?;
                    Self::condition(mapping, value, out)?;
                }
            }
        }
        Ok(())
    }

    fn condition(
        mapping: &'static FieldMapping,
        value: &JsonValue,
        out: &mut Vec<Condition>,
    ) -> Result<(), Error> {
        let JsonValue::Object(ops) = value else {
            out.push(Condition {
                column: mapping.column,
                op: Operator::Eq,
                values: vec![coerce_json(mapping, value)?],
            });
            return Ok(());
        };

        if ops.is_empty() {
            return Err(filter_value(mapping.field, "empty operator object"));
        }

        for (keyword, operand) in ops {
            let op = Operator::parse(keyword)?;
            let values = match op {
                Operator::In => {
                    let items = operand
                        .as_array()
                        .filter(|items| !items.is_empty())
                        .ok_or_else(|| filter_value(mapping.field, "inq expects a non-empty array"))?;
                    items
                        .iter()
                        .map(|item| coerce_json(mapping, item))
                        .collect::<Result<Vec<_>, _>>()?
                }
                _ => vec![coerce_json(mapping, operand)?],
            };
            out.push(Condition {
                column: mapping.column,
                op,
                values,
            });
        }
        Ok(())
    }
}

fn unsupported(operator: &str) -> Error {
    InvalidInputError::UnsupportedOperator {
        operator: operator.to_string(),
    }
    .into()
}

fn filter_value(field: &str, reason: &str) -> Error {
    InvalidInputError::FilterValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
