//! Database layer for querygate.
//!
//! Opens caller-supplied SQLite files strictly read-only, executes validated
//! statements against them, and reads table DDL for prompt context.

mod sandbox;
mod schema;
mod types;

pub use sandbox::{DataSourceHandle, SandboxExecutor};
pub use schema::{format_ddl, schema_ddl, EMPTY_SCHEMA};
pub use types::{QueryResult, Row, Value};
