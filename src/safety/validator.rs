//! SQL parsing and read-only validation logic.
//!
//! Uses sqlparser-rs with the SQLite dialect, matching the engine the
//! sandbox executes against.

use std::ops::ControlFlow;

use sqlparser::ast::{Query, SetExpr, Statement, Visit, Visitor};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::error::{GatewayError, Result};

use super::StatementKind;

/// A single statement proven to be a pure read.
///
/// Only [`SqlValidator`] can construct one; holding it is the sole
/// authorization to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStatement {
    sql: String,
    statement: Statement,
}

impl ValidatedStatement {
    fn new(sql: String, statement: Statement) -> Self {
        Self { sql, statement }
    }

    /// Returns the candidate text that was validated.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parsed statement.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Consumes the statement, returning the source text and parsed tree.
    pub fn into_parts(self) -> (String, Statement) {
        (self.sql, self.statement)
    }
}

/// Validator that admits only single, pure read statements.
#[derive(Debug)]
pub struct SqlValidator {
    dialect: SQLiteDialect,
}

impl Default for SqlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlValidator {
    /// Creates a new validator.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Validates a candidate and returns the accepted statement.
    ///
    /// Checks run in a fixed order: emptiness, parsing, statement count,
    /// forbidden commands anywhere in the tree, then the top-level read check.
    pub fn validate(&self, candidate: &str) -> Result<ValidatedStatement> {
        let sql = candidate.trim();
        if sql.is_empty() {
            return Err(GatewayError::empty_query("Query is empty"));
        }

        let mut statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| GatewayError::parse(e.to_string()))?;

        match statements.len() {
            0 => return Err(GatewayError::parse("No statement found")),
            1 => {}
            n => {
                return Err(GatewayError::multi_statement(format!(
                    "Only a single statement is allowed, found {n}"
                )))
            }
        }

        let statement = statements.remove(0);

        if let ControlFlow::Break(kind) = statement.visit(&mut MutationFinder) {
            return Err(GatewayError::forbidden(format!("{kind} is not allowed")));
        }

        if !is_pure_read(&statement) {
            return Err(GatewayError::not_a_select(format!(
                "Only SELECT queries are allowed, got {}",
                classify_statement(&statement)
            )));
        }

        Ok(ValidatedStatement::new(sql.to_string(), statement))
    }
}

/// Convenience function to validate SQL without creating a validator instance.
pub fn validate_sql(candidate: &str) -> Result<ValidatedStatement> {
    SqlValidator::new().validate(candidate)
}

/// Classifies a single parsed statement by its top-level node.
pub fn classify_statement(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(query) if has_select_into(&query.body) => StatementKind::SelectInto,
        Statement::Query(_) => StatementKind::Select,

        Statement::Insert { .. } => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete { .. } => StatementKind::Delete,
        Statement::Merge { .. } => StatementKind::Merge,

        Statement::Drop { .. }
        | Statement::DropFunction { .. }
        | Statement::DropProcedure { .. }
        | Statement::DropTrigger { .. } => StatementKind::Drop,
        Statement::Truncate { .. } => StatementKind::Truncate,
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => StatementKind::Alter,
        Statement::CreateTable { .. }
        | Statement::CreateVirtualTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. }
        | Statement::CreateTrigger { .. } => StatementKind::Create,

        Statement::Explain { .. } => StatementKind::Explain,
        Statement::Pragma { .. } => StatementKind::Pragma,
        Statement::AttachDatabase { .. } => StatementKind::Attach,

        _ => StatementKind::Other,
    }
}

/// Walks the whole statement tree and stops at the first mutation.
///
/// Nested statements (data-modifying CTE bodies, `EXPLAIN` targets) and
/// every query block, including subqueries in expressions, are visited.
struct MutationFinder;

impl Visitor for MutationFinder {
    type Break = StatementKind;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        let kind = classify_statement(statement);
        if kind.is_mutation() {
            return ControlFlow::Break(kind);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if has_select_into(&query.body) {
            return ControlFlow::Break(StatementKind::SelectInto);
        }
        ControlFlow::Continue(())
    }
}

/// Returns true if any select block in this body (not nested queries,
/// which the visitor reaches on its own) carries an `INTO` clause.
fn has_select_into(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select.into.is_some(),
        SetExpr::SetOperation { left, right, .. } => {
            has_select_into(left) || has_select_into(right)
        }
        _ => false,
    }
}

/// Returns true if the statement is a query made only of select blocks.
///
/// `VALUES`, `TABLE`, and data-modifying bodies are not reads here.
fn is_pure_read(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => is_select_body(&query.body),
        _ => false,
    }
}

fn is_select_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) => true,
        SetExpr::Query(query) => is_select_body(&query.body),
        SetExpr::SetOperation { left, right, .. } => is_select_body(left) && is_select_body(right),
        _ => false,
    }
}
