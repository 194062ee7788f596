//! Error types for querygate.
//!
//! Every pipeline stage reports failure through [`GatewayError`]; nothing in
//! the gateway panics on bad model output, bad SQL, or a bad data file.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The text generator was unavailable or returned an error.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The extractor found nothing SQL-shaped in the model output.
    #[error("No SQL found: {0}")]
    NoCandidateFound(String),

    /// The candidate was empty or whitespace-only.
    #[error("Empty query: {0}")]
    EmptyQuery(String),

    /// The candidate could not be parsed as SQLite SQL.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The candidate contained more than one statement.
    #[error("Multiple statements: {0}")]
    MultiStatement(String),

    /// The candidate contained a data-modifying or schema-changing command.
    #[error("Forbidden command: {0}")]
    ForbiddenCommand(String),

    /// The candidate parsed cleanly but is not a plain SELECT.
    #[error("Not a SELECT: {0}")]
    NotASelect(String),

    /// No usable data file is associated with the request.
    #[error("Data source missing: {0}")]
    DataSourceMissing(String),

    /// The engine failed while opening the file or running the statement.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration errors (invalid config file, unknown provider, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable tag for each [`GatewayError`] variant, used in logs and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    GenerationError,
    NoCandidateFound,
    EmptyQuery,
    ParseError,
    MultiStatement,
    ForbiddenCommand,
    NotASelect,
    DataSourceMissing,
    ExecutionError,
    ConfigError,
}

impl ErrorKind {
    /// Returns the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerationError => "generation_error",
            Self::NoCandidateFound => "no_candidate_found",
            Self::EmptyQuery => "empty_query",
            Self::ParseError => "parse_error",
            Self::MultiStatement => "multi_statement",
            Self::ForbiddenCommand => "forbidden_command",
            Self::NotASelect => "not_a_select",
            Self::DataSourceMissing => "data_source_missing",
            Self::ExecutionError => "execution_error",
            Self::ConfigError => "config_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayError {
    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a no-candidate error with the given message.
    pub fn no_candidate(msg: impl Into<String>) -> Self {
        Self::NoCandidateFound(msg.into())
    }

    /// Creates an empty-query error with the given message.
    pub fn empty_query(msg: impl Into<String>) -> Self {
        Self::EmptyQuery(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a multi-statement error with the given message.
    pub fn multi_statement(msg: impl Into<String>) -> Self {
        Self::MultiStatement(msg.into())
    }

    /// Creates a forbidden-command error with the given message.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::ForbiddenCommand(msg.into())
    }

    /// Creates a not-a-select error with the given message.
    pub fn not_a_select(msg: impl Into<String>) -> Self {
        Self::NotASelect(msg.into())
    }

    /// Creates a data-source-missing error with the given message.
    pub fn data_source_missing(msg: impl Into<String>) -> Self {
        Self::DataSourceMissing(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generation(_) => ErrorKind::GenerationError,
            Self::NoCandidateFound(_) => ErrorKind::NoCandidateFound,
            Self::EmptyQuery(_) => ErrorKind::EmptyQuery,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::MultiStatement(_) => ErrorKind::MultiStatement,
            Self::ForbiddenCommand(_) => ErrorKind::ForbiddenCommand,
            Self::NotASelect(_) => ErrorKind::NotASelect,
            Self::DataSourceMissing(_) => ErrorKind::DataSourceMissing,
            Self::Execution(_) => ErrorKind::ExecutionError,
            Self::Config(_) => ErrorKind::ConfigError,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Generation(_) | Self::Config(_) => "System Error",
            Self::NoCandidateFound(_) => "Generation Error",
            Self::EmptyQuery(_)
            | Self::Parse(_)
            | Self::MultiStatement(_)
            | Self::ForbiddenCommand(_)
            | Self::NotASelect(_) => "Validation Error",
            Self::DataSourceMissing(_) => "Data Source Error",
            Self::Execution(_) => "Execution Error",
        }
    }

    /// Returns true if the validator refused the candidate.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::EmptyQuery(_)
                | Self::Parse(_)
                | Self::MultiStatement(_)
                | Self::ForbiddenCommand(_)
                | Self::NotASelect(_)
        )
    }

    /// Returns the message shown to an end user.
    ///
    /// Validator rejections collapse into a single message; only the engine's
    /// own message string is passed through for execution failures.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(msg) => format!("A system error occurred: {msg}"),
            Self::Config(msg) => format!("Configuration error: {msg}"),
            Self::NoCandidateFound(_) => "Could not understand the question.".to_string(),
            _ if self.is_rejection() => "The generated query was not safe to run.".to_string(),
            Self::DataSourceMissing(_) => {
                "No database file is associated with this request.".to_string()
            }
            Self::Execution(msg) => format!("Interpreter Error: {msg}"),
            _ => self.to_string(),
        }
    }
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
