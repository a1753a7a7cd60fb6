//! Filesystem storage for the file-backed store.
//!
//! ```text
//! <root>/<keyspace>/<table>/schema.json
//! <root>/<keyspace>/<table>/rows/<key>.json
//! <root>/<keyspace>/<table>/.lock
//! ```
//!
//! Writes go to a temporary file that is renamed into place while holding
//! an exclusive lock on the table's lock file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use userbase_core::Result;
use userbase_core::error::{Error, QueryError};
use userbase_core::schema::TableSchema;
use userbase_core::value::{CqlValue, Row};

fn map_io(err: std::io::Error) -> Error {
    Error::Query(QueryError::Io {
        message: err.to_string(),
    })
}

fn map_json(path: &Path, err: serde_json::Error) -> Error {
    Error::Query(QueryError::Io {
        message: format!("{}: {}", path.display(), err),
    })
}

/// The file name stem for a partition key value.
///
/// UUIDs and integers are written as-is; text keys escape every byte
/// outside `[A-Za-z0-9_-]` as `%XX`.
///
/// # Errors
///
/// Returns [`QueryError::TypeMismatch`] for null and for types that cannot
/// be partition keys here.
pub fn key_name(column: &str, value: &CqlValue) -> Result<String> {
    match value {
        CqlValue::Uuid(uuid) => Ok(uuid.to_string()),
        CqlValue::Int(v) => Ok(v.to_string()),
        CqlValue::BigInt(v) => Ok(v.to_string()),
        CqlValue::Text(s) if !s.is_empty() => {
            let mut name = String::with_capacity(s.len());
            for byte in s.bytes() {
                if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                    name.push(char::from(byte));
                } else {
                    name.push_str(&format!("%{:02X}", byte));
                }
            }
            Ok(name)
        }
        other => Err(QueryError::TypeMismatch {
            column: column.to_string(),
            expected: "a non-empty partition key".to_string(),
            found: other.type_name().to_string(),
        }
        .into()),
    }
}

/// Filesystem-backed storage for a set of keyspaces.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // Unquoted identifiers are case-insensitive, for keyspaces and tables alike.
    fn keyspace_dir(&self, keyspace: &str) -> PathBuf {
        self.root.join(keyspace.to_ascii_lowercase())
    }

    fn table_dir(&self, keyspace: &str, table: &str) -> PathBuf {
        self.keyspace_dir(keyspace).join(table.to_ascii_lowercase())
    }

    fn schema_path(&self, keyspace: &str, table: &str) -> PathBuf {
        self.table_dir(keyspace, table).join("schema.json")
    }

    fn rows_dir(&self, keyspace: &str, table: &str) -> PathBuf {
        self.table_dir(keyspace, table).join("rows")
    }

    fn row_path(&self, keyspace: &str, table: &str, key: &str) -> PathBuf {
        self.rows_dir(keyspace, table).join(format!("{}.json", key))
    }

    fn lock_path(&self, keyspace: &str, table: &str) -> PathBuf {
        self.table_dir(keyspace, table).join(".lock")
    }

    /// Create the keyspace directory.
    pub fn create_keyspace(&self, keyspace: &str) -> Result<()> {
        fs::create_dir_all(self.keyspace_dir(keyspace)).map_err(map_io)
    }

    /// Run `f` while holding the table's exclusive lock.
    fn with_lock<T>(&self, keyspace: &str, table: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_path = self.lock_path(keyspace, table);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io)?;

        lock_file.lock_exclusive().map_err(map_io)?;
        let result = f();
        lock_file.unlock().map_err(map_io)?;

        result
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let content = serde_json::to_string_pretty(value).map_err(|e| map_json(path, e))?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(map_io)?;
        fs::rename(&temp_path, path).map_err(map_io)?;
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| map_json(path, e))
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Write the table definition unless the table already exists.
    ///
    /// Returns true if the table was created.
    pub fn ensure_table(&self, keyspace: &str, schema: &TableSchema) -> Result<bool> {
        self.with_lock(keyspace, &schema.name, || {
            let path = self.schema_path(keyspace, &schema.name);
            if path.exists() {
                return Ok(false);
            }
            Self::write_json(&path, schema)?;
            fs::create_dir_all(self.rows_dir(keyspace, &schema.name)).map_err(map_io)?;
            debug!(keyspace, table = %schema.name, "Created table");
            Ok(true)
        })
    }

    /// Load a table definition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownTable`] if the table was never created.
    pub fn load_schema(&self, keyspace: &str, table: &str) -> Result<TableSchema> {
        Self::read_json(&self.schema_path(keyspace, table))?.ok_or_else(|| {
            QueryError::UnknownTable {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            }
            .into()
        })
    }

    // ========================================================================
    // Rows
    // ========================================================================

    pub fn read_row(&self, keyspace: &str, table: &str, key: &str) -> Result<Option<Row>> {
        Self::read_json(&self.row_path(keyspace, table, key))
    }

    /// Replace a row.
    pub fn write_row(&self, keyspace: &str, table: &str, key: &str, row: &Row) -> Result<()> {
        self.with_lock(keyspace, table, || {
            Self::write_json(&self.row_path(keyspace, table, key), row)
        })
    }

    /// Set the given cells on a row, creating it if absent.
    pub fn merge_row(&self, keyspace: &str, table: &str, key: &str, cells: &Row) -> Result<()> {
        self.with_lock(keyspace, table, || {
            let path = self.row_path(keyspace, table, key);
            let mut row: Row = Self::read_json(&path)?.unwrap_or_default();
            for (column, value) in cells.iter() {
                row.set(column, value.clone());
            }
            Self::write_json(&path, &row)
        })
    }

    /// Remove a row. Missing rows are ignored.
    pub fn delete_row(&self, keyspace: &str, table: &str, key: &str) -> Result<()> {
        self.with_lock(keyspace, table, || {
            match fs::remove_file(self.row_path(keyspace, table, key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(map_io(e)),
            }
        })
    }

    /// Read every row of a table as `(key, row)` pairs, in no particular order.
    ///
    /// Rows that cannot be read are skipped with a warning.
    pub fn scan(&self, keyspace: &str, table: &str) -> Result<Vec<(String, Row)>> {
        let dir = self.rows_dir(keyspace, table);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        for entry in fs::read_dir(&dir).map_err(map_io)? {
            let path = entry.map_err(map_io)?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Self::read_json::<Row>(&path) {
                Ok(Some(row)) => rows.push((key.to_string(), row)),
                // Deleted between listing and reading.
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable row"),
            }
        }

        Ok(rows)
    }
}
