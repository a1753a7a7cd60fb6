//! Store-native values and rows.
//!
//! [`CqlValue`] is the typed cell value exchanged with the store client;
//! [`Row`] is one result row as an ordered list of named cells.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CqlType {
    Boolean,
    Int,
    BigInt,
    Counter,
    Double,
    Text,
    Uuid,
    Timestamp,
}

impl CqlType {
    /// Returns the type name as written in a table definition.
    pub fn as_cql(&self) -> &'static str {
        match self {
            CqlType::Boolean => "boolean",
            CqlType::Int => "int",
            CqlType::BigInt => "bigint",
            CqlType::Counter => "counter",
            CqlType::Double => "double",
            CqlType::Text => "text",
            CqlType::Uuid => "uuid",
            CqlType::Timestamp => "timestamp",
        }
    }

    /// Returns true if a value may be stored in a column of this type.
    ///
    /// `Null` is accepted by every type.
    pub fn accepts(&self, value: &CqlValue) -> bool {
        match value.cql_type() {
            None => true,
            Some(t) => t == *self,
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cql())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CqlValue {
    Null,
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    /// A 64-bit counter as returned by aggregates.
    Counter(i64),
    Double(f64),
    Text(String),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl CqlValue {
    /// Returns the type of this value, or `None` for `Null`.
    pub fn cql_type(&self) -> Option<CqlType> {
        match self {
            CqlValue::Null => None,
            CqlValue::Boolean(_) => Some(CqlType::Boolean),
            CqlValue::Int(_) => Some(CqlType::Int),
            CqlValue::BigInt(_) => Some(CqlType::BigInt),
            CqlValue::Counter(_) => Some(CqlType::Counter),
            CqlValue::Double(_) => Some(CqlType::Double),
            CqlValue::Text(_) => Some(CqlType::Text),
            CqlValue::Uuid(_) => Some(CqlType::Uuid),
            CqlValue::Timestamp(_) => Some(CqlType::Timestamp),
        }
    }

    /// Returns a short name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        self.cql_type().map_or("null", |t| t.as_cql())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Compare two values of compatible types.
    ///
    /// Integer kinds compare with each other; everything else only compares
    /// with its own kind. Returns `None` for incomparable pairs and for `Null`.
    pub fn compare(&self, other: &CqlValue) -> Option<Ordering> {
        use CqlValue::*;

        match (self, other) {
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Double(a), Double(b)) => a.partial_cmp(b),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        }
    }

    /// Widen an integer-kind value to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CqlValue::Int(v) => Some(i64::from(*v)),
            CqlValue::BigInt(v) | CqlValue::Counter(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Null => f.write_str("null"),
            CqlValue::Boolean(v) => write!(f, "{}", v),
            CqlValue::Int(v) => write!(f, "{}", v),
            CqlValue::BigInt(v) | CqlValue::Counter(v) | CqlValue::Timestamp(v) => {
                write!(f, "{}", v)
            }
            CqlValue::Double(v) => write!(f, "{}", v),
            CqlValue::Text(v) => write!(f, "'{}'", v.replace('\'', "''")),
            CqlValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

/// One row: named cells in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: Vec<(String, CqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell and return the row, for building rows inline.
    pub fn with(mut self, column: impl Into<String>, value: CqlValue) -> Self {
        self.set(column, value);
        self
    }

    /// Set a cell, replacing any cell with the same (case-insensitive) name.
    pub fn set(&mut self, column: impl Into<String>, value: CqlValue) {
        let column = column.into();
        match self
            .cells
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&column))
        {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Look up a cell by column name, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Iterate cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CqlValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, CqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CqlValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.set(column, value);
        }
        row
    }
}
