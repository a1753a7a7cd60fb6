//! Row mapping between store rows and the [`User`] entity.
//!
//! This module owns the field-to-column translation table. Entity fields use
//! camelCase (`createdAt`); store columns use snake_case (`created_at`), and
//! column names coming back from the store are matched without regard to case.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, InvalidInputError, QueryError};
use crate::model::User;
use crate::schema::TableSchema;
use crate::types::UserId;
use crate::value::{CqlType, CqlValue, Row};

/// The table users are stored in.
pub const USERS_TABLE: &str = "users";

/// Column holding aggregate counts.
pub const COUNT_COLUMN: &str = "count";

/// One entity field and the column backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: &'static str,
    pub column: &'static str,
    pub cql_type: CqlType,
}

/// A field-to-column translation table for one entity.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    fields: &'static [FieldMapping],
}

impl ColumnMap {
    pub const fn new(fields: &'static [FieldMapping]) -> Self {
        Self { fields }
    }

    /// Resolve an entity field name to its column.
    ///
    /// Field names match exactly; column names are also accepted and match
    /// without regard to case.
    pub fn resolve(&self, name: &str) -> Option<&'static FieldMapping> {
        let fields: &'static [FieldMapping] = self.fields;
        fields
            .iter()
            .find(|m| m.field == name)
            .or_else(|| fields.iter().find(|m| m.column.eq_ignore_ascii_case(name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static FieldMapping> + use<> {
        let fields: &'static [FieldMapping] = self.fields;
        fields.iter()
    }
}

const USER_FIELDS: [FieldMapping; 5] = [
    FieldMapping {
        field: "id",
        column: "id",
        cql_type: CqlType::Uuid,
    },
    FieldMapping {
        field: "name",
        column: "name",
        cql_type: CqlType::Text,
    },
    FieldMapping {
        field: "email",
        column: "email",
        cql_type: CqlType::Text,
    },
    FieldMapping {
        field: "age",
        column: "age",
        cql_type: CqlType::Int,
    },
    FieldMapping {
        field: "createdAt",
        column: "created_at",
        cql_type: CqlType::Timestamp,
    },
];

/// The column map for [`User`].
pub const USER_COLUMNS: ColumnMap = ColumnMap::new(&USER_FIELDS);

/// The table definition for users.
pub fn users_schema() -> TableSchema {
    USER_COLUMNS.iter().skip(1).fold(
        TableSchema::new(USERS_TABLE, ("id", CqlType::Uuid)),
        |schema, m| schema.column(m.column, m.cql_type),
    )
}

/// Convert a store row into a user.
///
/// # Errors
///
/// Returns [`QueryError::MissingColumn`] if a required column is absent or
/// null, and [`QueryError::TypeMismatch`] if a cell has the wrong type or an
/// integer does not fit.
pub fn to_entity(row: &Row) -> Result<User, Error> {
    let id = match required(row, "id")? {
        CqlValue::Uuid(uuid) => UserId::from(*uuid),
        other => return Err(mismatch("id", CqlType::Uuid, other)),
    };

    Ok(User {
        id,
        name: text(row, "name")?,
        email: text(row, "email")?,
        age: optional_int(row, "age")?,
        created_at: timestamp(row, "created_at")?,
    })
}

/// Convert a user into a store row.
pub fn to_row(user: &User) -> Row {
    Row::new()
        .with("id", id_value(&user.id))
        .with("name", CqlValue::Text(user.name.clone()))
        .with("email", CqlValue::Text(user.email.clone()))
        .with("age", user.age.map_or(CqlValue::Null, CqlValue::Int))
        .with("created_at", CqlValue::Timestamp(user.created_at.timestamp_millis()))
}

/// The partition key value for a user id.
pub fn id_value(id: &UserId) -> CqlValue {
    CqlValue::Uuid(*id.as_uuid())
}

/// Read an aggregate count from a result row.
///
/// A null or absent count is zero.
///
/// # Errors
///
/// Returns [`QueryError::TypeMismatch`] for a non-integer or negative count.
pub fn count_from_row(row: &Row) -> Result<u64, Error> {
    match row.get(COUNT_COLUMN) {
        None | Some(CqlValue::Null) => Ok(0),
        Some(value) => value
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| mismatch(COUNT_COLUMN, CqlType::Counter, value)),
    }
}

/// Coerce a JSON filter value into the column's store type.
///
/// # Errors
///
/// Returns [`InvalidInputError::FilterValue`] for `null` and for values that
/// cannot represent the column type.
pub fn coerce_json(mapping: &FieldMapping, value: &JsonValue) -> Result<CqlValue, Error> {
    let reject = |reason: String| -> Error {
        InvalidInputError::FilterValue {
            field: mapping.field.to_string(),
            reason,
        }
        .into()
    };

    if value.is_null() {
        return Err(reject("null comparisons are not supported".to_string()));
    }

    match mapping.cql_type {
        CqlType::Text => value
            .as_str()
            .map(|s| CqlValue::Text(s.to_string()))
            .ok_or_else(|| reject(format!("expected a string, got {}", value))),
        CqlType::Uuid => value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(CqlValue::Uuid)
            .ok_or_else(|| reject(format!("expected a UUID string, got {}", value))),
        CqlType::Int => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(CqlValue::Int)
            .ok_or_else(|| reject(format!("expected a 32-bit integer, got {}", value))),
        CqlType::BigInt | CqlType::Counter => value
            .as_i64()
            .map(CqlValue::BigInt)
            .ok_or_else(|| reject(format!("expected an integer, got {}", value))),
        CqlType::Double => value
            .as_f64()
            .map(CqlValue::Double)
            .ok_or_else(|| reject(format!("expected a number, got {}", value))),
        CqlType::Boolean => value
            .as_bool()
            .map(CqlValue::Boolean)
            .ok_or_else(|| reject(format!("expected a boolean, got {}", value))),
        CqlType::Timestamp => match value {
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| CqlValue::Timestamp(dt.timestamp_millis()))
                .map_err(|e| reject(format!("expected an RFC 3339 timestamp: {}", e))),
            JsonValue::Number(n) => n
                .as_i64()
                .map(CqlValue::Timestamp)
                .ok_or_else(|| reject(format!("expected epoch milliseconds, got {}", n))),
            other => Err(reject(format!("expected a timestamp, got {}", other))),
        },
    }
}

fn required<'a>(row: &'a Row, column: &str) -> Result<&'a CqlValue, Error> {
    match row.get(column) {
        None | Some(CqlValue::Null) => Err(QueryError::MissingColumn {
            column: column.to_string(),
        }
        .into()),
        Some(value) => Ok(value),
    }
}

fn text(row: &Row, column: &str) -> Result<String, Error> {
    match required(row, column)? {
        CqlValue::Text(s) => Ok(s.clone()),
        other => Err(mismatch(column, CqlType::Text, other)),
    }
}

fn optional_int(row: &Row, column: &str) -> Result<Option<i32>, Error> {
    match row.get(column) {
        None | Some(CqlValue::Null) => Ok(None),
        Some(CqlValue::Int(v)) => Ok(Some(*v)),
        // Wide integers are narrowed with a checked conversion.
        Some(value @ (CqlValue::BigInt(_) | CqlValue::Counter(_))) => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| mismatch(column, CqlType::Int, value)),
        Some(other) => Err(mismatch(column, CqlType::Int, other)),
    }
}

fn timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, Error> {
    match required(row, column)? {
        CqlValue::Timestamp(ms) => Utc
            .timestamp_millis_opt(*ms)
            .single()
            .ok_or_else(|| mismatch(column, CqlType::Timestamp, &CqlValue::Timestamp(*ms))),
        other => Err(mismatch(column, CqlType::Timestamp, other)),
    }
}

fn mismatch(column: &str, expected: CqlType, found: &CqlValue) -> Error {
    QueryError::TypeMismatch {
        column: column.to_string(),
        expected: expected.to_string(),
        found: format!("{} ({})", found.type_name(), found),
    }
    .into()
}
