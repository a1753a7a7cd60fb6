//! Table definitions.

use serde::{Deserialize, Serialize};

use crate::value::CqlType;

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub cql_type: CqlType,
}

/// A table with a single-column partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub partition_key: String,
}

impl TableSchema {
    /// Start a schema with the given table name and partition key column.
    pub fn new(name: impl Into<String>, partition_key: (&str, CqlType)) -> Self {
        let (key, key_type) = partition_key;
        Self {
            name: name.into(),
            columns: vec![ColumnDef {
                name: key.to_string(),
                cql_type: key_type,
            }],
            partition_key: key.to_string(),
        }
    }

    /// Add a regular column.
    pub fn column(mut self, name: &str, cql_type: CqlType) -> Self {
        self.columns.push(ColumnDef {
            name: name.to_string(),
            cql_type,
        });
        self
    }

    /// Look up a column by name, ignoring ASCII case.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_partition_key(&self, column: &str) -> bool {
        self.partition_key.eq_ignore_ascii_case(column)
    }

    /// Render the definition as a `CREATE TABLE IF NOT EXISTS` statement.
    pub fn to_cql(&self, keyspace: &str) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if self.is_partition_key(&c.name) {
                    format!("{} {} PRIMARY KEY", c.name, c.cql_type)
                } else {
                    format!("{} {}", c.name, c.cql_type)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE TABLE IF NOT EXISTS {}.{} ({})",
            keyspace, self.name, columns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_create_statement() {
        let schema = TableSchema::new("users", ("id", CqlType::Uuid))
            .column("name", CqlType::Text)
            .column("age", CqlType::Int);

        assert_eq!(
            schema.to_cql("ks"),
            "CREATE TABLE IF NOT EXISTS ks.users (id uuid PRIMARY KEY, name text, age int)"
        );
    }

    #[test]
    fn column_lookup_ignores_case() {
        let schema = TableSchema::new("users", ("id", CqlType::Uuid));
        assert!(schema.get_column("ID").is_some());
        assert!(schema.is_partition_key("Id"));
    }
}
