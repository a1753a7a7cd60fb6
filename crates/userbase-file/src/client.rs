//! File-backed store client.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use userbase_core::error::{QueryError, UnavailableError};
use userbase_core::query::Operator;
use userbase_core::schema::TableSchema;
use userbase_core::traits::{QueryOptions, ResultPage, StoreClient};
use userbase_core::value::{CqlValue, Row};
use userbase_core::{Keyspace, Result};

use crate::cql::{self, Projection, Select};
use crate::paging::ScanPosition;
use crate::store::{FileStore, key_name};

/// Rows per page when the caller sets no fetch size.
pub const DEFAULT_FETCH_SIZE: u32 = 5000;

/// A condition with its parameters bound.
#[derive(Debug)]
struct Bound {
    column: String,
    op: Operator,
    values: Vec<CqlValue>,
}

impl Bound {
    fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(&self.column) else {
            return false;
        };
        let ordering = |value: &CqlValue| cell.compare(value);
        match self.op {
            Operator::Eq => ordering(&self.values[0]).is_some_and(|o| o.is_eq()),
            Operator::Gt => ordering(&self.values[0]).is_some_and(|o| o.is_gt()),
            Operator::Gte => ordering(&self.values[0]).is_some_and(|o| o.is_ge()),
            Operator::Lt => ordering(&self.values[0]).is_some_and(|o| o.is_lt()),
            Operator::Lte => ordering(&self.values[0]).is_some_and(|o| o.is_le()),
            Operator::In => self
                .values
                .iter()
                .any(|value| ordering(value).is_some_and(|o| o.is_eq())),
        }
    }
}

/// A client bound to one keyspace of a [`FileStore`].
///
/// Cloning is not supported; share the client behind an `Arc`.
#[derive(Debug)]
pub struct FileClient {
    store: FileStore,
    keyspace: Keyspace,
    data_center: String,
    open: AtomicBool,
}

impl FileClient {
    pub(crate) fn new(store: FileStore, keyspace: Keyspace, data_center: String) -> Self {
        Self {
            store,
            keyspace,
            data_center,
            open: AtomicBool::new(true),
        }
    }

    pub fn data_center(&self) -> &str {
        &self.data_center
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.open.load(Ordering::Acquire) {
            return Err(UnavailableError::Closed {
                keyspace: self.keyspace.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn ks(&self) -> &str {
        self.keyspace.as_str()
    }

    /// Resolve the statement's table, rejecting other keyspaces.
    fn schema_for(&self, select: &Select) -> Result<TableSchema> {
        if let Some(keyspace) = &select.keyspace {
            if keyspace != self.ks() {
                return Err(QueryError::UnknownTable {
                    keyspace: keyspace.clone(),
                    table: select.table.clone(),
                }
                .into());
            }
        }
        self.store.load_schema(self.ks(), &select.table)
    }

    /// Check the clauses against the schema and attach their parameters.
    fn bind(select: &Select, schema: &TableSchema, params: &[CqlValue]) -> Result<Vec<Bound>> {
        let expected = select.parameter_count();
        if expected != params.len() {
            return Err(QueryError::ParameterCount {
                expected,
                found: params.len(),
            }
            .into());
        }

        let mut remaining = params;
        let mut bound = Vec::with_capacity(select.clauses.len());
        for clause in &select.clauses {
            let column = schema
                .get_column(&clause.column)
                .ok_or_else(|| QueryError::MissingColumn {
                    column: clause.column.clone(),
                })?;

            if !select.allow_filtering && !schema.is_partition_key(&column.name) {
                return Err(QueryError::FilteringRequired {
                    column: column.name.clone(),
                }
                .into());
            }

            let (values, rest) = remaining.split_at(clause.arity);
            remaining = rest;
            for value in values {
                if value.is_null() || !column.cql_type.accepts(value) {
                    return Err(QueryError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.cql_type.to_string(),
                        found: value.type_name().to_string(),
                    }
                    .into());
                }
            }

            bound.push(Bound {
                column: column.name.clone(),
                op: clause.op,
                values: values.to_vec(),
            });
        }
        Ok(bound)
    }

    /// Check a row against the schema and return its key's file name.
    fn check_row(schema: &TableSchema, row: &Row) -> Result<String> {
        for (column, value) in row.iter() {
            let def = schema
                .get_column(column)
                .ok_or_else(|| QueryError::MissingColumn {
                    column: column.to_string(),
                })?;
            if !def.cql_type.accepts(value) {
                return Err(QueryError::TypeMismatch {
                    column: def.name.clone(),
                    expected: def.cql_type.to_string(),
                    found: value.type_name().to_string(),
                }
                .into());
            }
        }

        let key = row
            .get(&schema.partition_key)
            .ok_or_else(|| QueryError::MissingColumn {
                column: schema.partition_key.clone(),
            })?;
        key_name(&schema.partition_key, key)
    }

    fn key_for(schema: &TableSchema, key: &CqlValue) -> Result<String> {
        let def = schema
            .get_column(&schema.partition_key)
            .ok_or_else(|| QueryError::MissingColumn {
                column: schema.partition_key.clone(),
            })?;
        if !def.cql_type.accepts(key) {
            return Err(QueryError::TypeMismatch {
                column: def.name.clone(),
                expected: def.cql_type.to_string(),
                found: key.type_name().to_string(),
            }
            .into());
        }
        key_name(&schema.partition_key, key)
    }

    /// Matching rows in token order, starting after `after`.
    fn matching(
        &self,
        table: &str,
        conditions: &[Bound],
        after: Option<&ScanPosition>,
    ) -> Result<Vec<(ScanPosition, Row)>> {
        let mut rows: Vec<(ScanPosition, Row)> = self
            .store
            .scan(self.ks(), table)?
            .into_iter()
            .map(|(key, row)| (ScanPosition::of(&key), row))
            .filter(|(pos, _)| after.is_none_or(|after| pos > after))
            .filter(|(_, row)| conditions.iter().all(|c| c.matches(row)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }
}

#[async_trait]
impl StoreClient for FileClient {
    fn keyspace(&self) -> &str {
        self.ks()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    #[instrument(skip(self, params, options), fields(keyspace = %self.keyspace, params = params.len()))]
    async fn execute(
        &self,
        query: &str,
        params: &[CqlValue],
        options: &QueryOptions,
    ) -> Result<ResultPage> {
        self.ensure_open()?;

        // Statements are parsed per call; `options.prepare` has nothing to cache.
        let select = cql::parse(query)?;
        let schema = self.schema_for(&select)?;
        let conditions = Self::bind(&select, &schema, params)?;

        if select.projection == Projection::Count {
            let rows = self.matching(&schema.name, &conditions, None)?;
            let count = i64::try_from(rows.len()).unwrap_or(i64::MAX);
            debug!(count, "Counted rows");
            return Ok(ResultPage {
                rows: vec![Row::new().with("count", CqlValue::Counter(count))],
                paging_state: None,
            });
        }

        let after = options
            .paging_state
            .as_ref()
            .map(ScanPosition::decode)
            .transpose()?;
        let fetch_size = options.fetch_size.unwrap_or(DEFAULT_FETCH_SIZE).max(1) as usize;

        let mut rows = self.matching(&schema.name, &conditions, after.as_ref())?;
        let has_more = rows.len() > fetch_size;
        rows.truncate(fetch_size);

        let paging_state = match rows.last() {
            Some((pos, _)) if has_more => Some(pos.encode()?),
            _ => None,
        };

        debug!(rows = rows.len(), has_more, "Executed select");
        Ok(ResultPage {
            rows: rows.into_iter().map(|(_, row)| row).collect(),
            paging_state,
        })
    }

    #[instrument(skip(self, schema), fields(keyspace = %self.keyspace, table = %schema.name))]
    async fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        self.ensure_open()?;
        if schema.get_column(&schema.partition_key).is_none() {
            return Err(QueryError::MissingColumn {
                column: schema.partition_key.clone(),
            }
            .into());
        }
        if self.store.ensure_table(self.ks(), schema)? {
            info!(statement = %schema.to_cql(self.ks()), "Created table");
        }
        Ok(())
    }

    async fn get_row(&self, table: &str, key: &CqlValue) -> Result<Option<Row>> {
        self.ensure_open()?;
        let schema = self.store.load_schema(self.ks(), table)?;
        let key = Self::key_for(&schema, key)?;
        self.store.read_row(self.ks(), table, &key)
    }

    #[instrument(skip(self, row), fields(keyspace = %self.keyspace))]
    async fn insert_row(&self, table: &str, row: &Row) -> Result<()> {
        self.ensure_open()?;
        let schema = self.store.load_schema(self.ks(), table)?;
        let key = Self::check_row(&schema, row)?;
        self.store.write_row(self.ks(), table, &key, row)?;
        debug!(%key, "Inserted row");
        Ok(())
    }

    #[instrument(skip(self, row), fields(keyspace = %self.keyspace))]
    async fn update_row(&self, table: &str, row: &Row) -> Result<()> {
        self.ensure_open()?;
        let schema = self.store.load_schema(self.ks(), table)?;
        let key = Self::check_row(&schema, row)?;
        self.store.merge_row(self.ks(), table, &key, row)?;
        debug!(%key, "Updated row");
        Ok(())
    }

    #[instrument(skip(self, key), fields(keyspace = %self.keyspace))]
    async fn remove_row(&self, table: &str, key: &CqlValue) -> Result<()> {
        self.ensure_open()?;
        let schema = self.store.load_schema(self.ks(), table)?;
        let key = Self::key_for(&schema, key)?;
        self.store.delete_row(self.ks(), table, &key)?;
        debug!(%key, "Removed row");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            info!(keyspace = %self.keyspace, "File client closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use userbase_core::PagingState;
    use userbase_core::value::CqlType;

    fn people() -> TableSchema {
        TableSchema::new("people", ("id", CqlType::Int))
            .column("name", CqlType::Text)
            .column("age", CqlType::Int)
    }

    async fn client_with_rows(dir: &TempDir, n: i32) -> FileClient {
        let client = FileClient::new(
            FileStore::new(dir.path()),
            Keyspace::new("ks").unwrap(),
            "dc1".to_string(),
        );
        client.ensure_table(&people()).await.unwrap();
        for id in 0..n {
            let row = Row::new()
                .with("id", CqlValue::Int(id))
                .with("name", CqlValue::Text(format!("p{}", id % 2)))
                .with("age", CqlValue::Int(20 + id));
            client.insert_row("people", &row).await.unwrap();
        }
        client
    }

    fn ids(page: &ResultPage) -> Vec<i32> {
        page.rows
            .iter()
            .map(|r| match r.get("id") {
                Some(CqlValue::Int(id)) => *id,
                other => panic!("unexpected id {:?}", other),
            })
            .collect()
    }

    #[tokio::test]
    async fn pages_cover_every_row_once() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 7).await;

        let mut seen = Vec::new();
        let mut options = QueryOptions {
            fetch_size: Some(3),
            ..Default::default()
        };
        let mut pages = 0;
        loop {
            let page = client
                .execute("SELECT * FROM people", &[], &options)
                .await
                .unwrap();
            pages += 1;
            seen.extend(ids(&page));
            match page.paging_state {
                Some(state) => options.paging_state = Some(state),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        seen.sort();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn exact_page_boundary_has_no_state() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 4).await;
        let options = QueryOptions {
            fetch_size: Some(4),
            ..Default::default()
        };
        let page = client
            .execute("SELECT * FROM people", &[], &options)
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 4);
        assert!(page.paging_state.is_none());
    }

    #[tokio::test]
    async fn filters_require_allow_filtering_off_key() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 4).await;
        let params = [CqlValue::Text("p1".into())];

        let err = client
            .execute("SELECT * FROM people WHERE name = ?", &params, &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            userbase_core::Error::Query(QueryError::FilteringRequired { .. })
        ));

        let page = client
            .execute(
                "SELECT * FROM people WHERE name = ? ALLOW FILTERING",
                &params,
                &QueryOptions::default(),
            )
            .await
            .unwrap();
        let mut found = ids(&page);
        found.sort();
        assert_eq!(found, [1, 3]);

        let by_key = client
            .execute("SELECT * FROM people WHERE id = ?", &[CqlValue::Int(2)], &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(ids(&by_key), [2]);
    }

    #[tokio::test]
    async fn range_and_in_conditions() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 6).await;

        let page = client
            .execute(
                "SELECT * FROM people WHERE age >= ? AND age < ? AND id IN (?, ?, ?) ALLOW FILTERING",
                &[
                    CqlValue::Int(21),
                    CqlValue::Int(25),
                    CqlValue::Int(0),
                    CqlValue::Int(2),
                    CqlValue::Int(4),
                ],
                &QueryOptions::default(),
            )
            .await
            .unwrap();
        let mut found = ids(&page);
        found.sort();
        assert_eq!(found, [2, 4]);
    }

    #[tokio::test]
    async fn count_ignores_fetch_size() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 5).await;
        let options = QueryOptions {
            fetch_size: Some(2),
            ..Default::default()
        };
        let page = client
            .execute("SELECT COUNT(*) FROM people", &[], &options)
            .await
            .unwrap();
        assert_eq!(page.rows[0].get("count"), Some(&CqlValue::Counter(5)));
        assert!(page.paging_state.is_none());
    }

    #[tokio::test]
    async fn rejects_bad_parameters() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 1).await;

        let err = client
            .execute("SELECT * FROM people WHERE id = ?", &[], &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            userbase_core::Error::Query(QueryError::ParameterCount { expected: 1, found: 0 })
        ));

        let err = client
            .execute(
                "SELECT * FROM people WHERE id = ?",
                &[CqlValue::Text("1".into())],
                &QueryOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            userbase_core::Error::Query(QueryError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_foreign_paging_state() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 1).await;
        let options = QueryOptions {
            paging_state: Some(PagingState::new(vec![7, 7, 7])),
            ..Default::default()
        };
        let err = client
            .execute("SELECT * FROM people", &[], &options)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            userbase_core::Error::Query(QueryError::InvalidPagingState { .. })
        ));
    }

    #[tokio::test]
    async fn writes_are_type_checked() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 0).await;

        let wrong_type = Row::new()
            .with("id", CqlValue::Int(1))
            .with("age", CqlValue::Text("old".into()));
        assert!(client.insert_row("people", &wrong_type).await.is_err());

        let unknown_column = Row::new()
            .with("id", CqlValue::Int(1))
            .with("nickname", CqlValue::Text("x".into()));
        assert!(client.insert_row("people", &unknown_column).await.is_err());

        let no_key = Row::new().with("name", CqlValue::Text("x".into()));
        assert!(client.insert_row("people", &no_key).await.is_err());
    }

    #[tokio::test]
    async fn update_merges_cells() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 1).await;

        let patch = Row::new()
            .with("id", CqlValue::Int(0))
            .with("age", CqlValue::Null);
        client.update_row("people", &patch).await.unwrap();

        let row = client
            .get_row("people", &CqlValue::Int(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("name"), Some(&CqlValue::Text("p0".into())));
        assert_eq!(row.get("age"), Some(&CqlValue::Null));
    }

    #[tokio::test]
    async fn closed_client_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let client = client_with_rows(&dir, 1).await;
        client.shutdown().await.unwrap();
        client.shutdown().await.unwrap();

        assert!(!client.is_open());
        let err = client
            .execute("SELECT * FROM people", &[], &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        let err = client.get_row("people", &CqlValue::Int(0)).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
