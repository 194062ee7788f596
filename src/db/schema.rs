//! Table DDL for prompt context.
//!
//! The DDL is read through the same read-only open path as query execution
//! and is only ever used to build prompt text.

use super::sandbox::{close_quietly, format_engine_error, open_read_only};
use super::DataSourceHandle;
use crate::error::{GatewayError, Result};

/// Text used in place of DDL when the file has no user tables.
pub const EMPTY_SCHEMA: &str = "-- No tables found in the database.";

const TABLE_DDL_QUERY: &str = "SELECT sql FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL \
     ORDER BY name";

/// Reads the `CREATE TABLE` statements of every user table in the file.
pub async fn schema_ddl(source: &DataSourceHandle) -> Result<String> {
    source.ensure_exists()?;

    let mut conn = open_read_only(source).await?;
    let fetched: std::result::Result<Vec<String>, sqlx::Error> =
        sqlx::query_scalar(TABLE_DDL_QUERY)
            .fetch_all(&mut conn)
            .await;
    close_quietly(conn).await;

    let statements =
        fetched.map_err(|e| GatewayError::execution(format_engine_error(&e)))?;
    tracing::debug!(tables = statements.len(), "Read table DDL");

    Ok(format_ddl(&statements))
}

/// Joins DDL statements, one per line, each with a `;` terminator.
pub fn format_ddl<S: AsRef<str>>(statements: &[S]) -> String {
    if statements.is_empty() {
        return EMPTY_SCHEMA.to_string();
    }

    statements
        .iter()
        .map(|s| format!("{};", s.as_ref().trim().trim_end_matches(';')))
        .collect::<Vec<_>>()
        .join("\n")
}
