//! Read-only statement validation.
//!
//! Parses candidate SQL with the SQLite dialect and admits it only if it is
//! exactly one pure read statement. Rejection is driven by the parsed tree,
//! never by searching the raw text for keywords.

mod validator;

pub use validator::{classify_statement, validate_sql, SqlValidator, ValidatedStatement};

use std::fmt;

/// The kind of a parsed statement, as far as validation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Alter,
    Drop,
    Truncate,
    /// `SELECT ... INTO`, which writes a new table.
    SelectInto,
    Explain,
    Pragma,
    Attach,
    /// Any statement the validator does not name explicitly.
    Other,
}

impl StatementKind {
    /// Returns true for data-modifying and schema-changing kinds.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Insert
                | Self::Update
                | Self::Delete
                | Self::Merge
                | Self::Create
                | Self::Alter
                | Self::Drop
                | Self::Truncate
                | Self::SelectInto
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Merge => write!(f, "MERGE"),
            Self::Create => write!(f, "CREATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::SelectInto => write!(f, "SELECT INTO"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Other => write!(f, "Other"),
        }
    }
}
