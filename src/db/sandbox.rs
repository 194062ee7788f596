//! Read-only SQLite execution.
//!
//! Every call opens its own connection with `SQLITE_OPEN_READONLY`, so a
//! write is refused by the engine itself. No pool is kept between calls.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use tracing::{debug, warn};

use crate::db::{QueryResult, Row, Value};
use crate::error::{GatewayError, Result};
use crate::safety::ValidatedStatement;

/// A caller-owned SQLite file.
///
/// The gateway never creates, writes, or deletes the file behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSourceHandle {
    path: PathBuf,
}

impl DataSourceHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails with `DataSourceMissing` unless the path is an existing regular file.
    pub(crate) fn ensure_exists(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(GatewayError::data_source_missing(format!(
                "{} is not an existing file",
                self.path.display()
            )))
        }
    }
}

/// Executes validated statements against a data source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SandboxExecutor;

impl SandboxExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Executes a validated statement and returns its columns and rows.
    pub async fn execute(
        &self,
        statement: &ValidatedStatement,
        source: &DataSourceHandle,
    ) -> Result<QueryResult> {
        self.run(statement.sql(), source).await
    }

    /// Runs SQL text without validation. Safety here rests solely on the
    /// read-only open.
    async fn run(&self, sql: &str, source: &DataSourceHandle) -> Result<QueryResult> {
        source.ensure_exists()?;

        let mut conn = open_read_only(source).await?;
        let start = Instant::now();
        let fetched = fetch(&mut conn, sql).await;
        close_quietly(conn).await;

        let (columns, rows) = fetched?;
        let execution_time = start.elapsed();
        debug!(
            rows = rows.len(),
            elapsed_ms = execution_time.as_millis() as u64,
            "Statement executed"
        );

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }
}

/// Opens a single read-only connection to the data source.
pub(crate) async fn open_read_only(source: &DataSourceHandle) -> Result<SqliteConnection> {
    let options = SqliteConnectOptions::new()
        .filename(source.path())
        .read_only(true)
        .create_if_missing(false);

    SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| GatewayError::execution(format_engine_error(&e)))
}

/// Closes a connection, logging rather than propagating a close failure.
pub(crate) async fn close_quietly(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close SQLite connection: {}", e);
    }
}

/// Fetches all rows eagerly; column names come from the first row, or from
/// the prepared statement when the result is empty.
async fn fetch(conn: &mut SqliteConnection, sql: &str) -> Result<(Vec<String>, Vec<Row>)> {
    let rows: Vec<SqliteRow> = sqlx::query(sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| GatewayError::execution(format_engine_error(&e)))?;

    let columns = match rows.first() {
        Some(first) => first
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect(),
        None => {
            let prepared = (&mut *conn)
                .prepare(sql)
                .await
                .map_err(|e| GatewayError::execution(format_engine_error(&e)))?;
            prepared
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect()
        }
    };

    Ok((columns, rows.iter().map(convert_row).collect()))
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts one cell by its storage class, not the declared column type.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Integer)
            .unwrap_or(Value::Null),

        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Real)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Blob)
            .unwrap_or(Value::Null),

        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}

/// Extracts the engine's own message from a sqlx error.
pub(crate) fn format_engine_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
