//! Error types for schema lookup and SQL generation.

use thiserror::Error;

/// Errors raised by schema lookups and validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The named table does not exist in the schema.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A value map or record referenced a column the table does not declare.
    #[error("unknown column {column} in table {table}")]
    UnknownColumn {
        /// Table that was consulted.
        table: String,
        /// Column that was not found.
        column: String,
    },

    /// A child relation names a column its child table does not declare.
    #[error("child relation {child} of {table} references missing column {column}")]
    InvalidChildRelation {
        /// Parent table declaring the relation.
        table: String,
        /// Child table name.
        child: String,
        /// The missing join column.
        column: String,
    },

    /// A composite child relation declares join column lists of different
    /// lengths, so the pairs cannot line up one-to-one.
    #[error("child relation {child} of {table} pairs {local} local with {foreign} foreign join columns")]
    MismatchedJoinColumns {
        /// Parent table declaring the relation.
        table: String,
        /// Child table name.
        child: String,
        /// Parent-side column count.
        local: usize,
        /// Child-side column count.
        foreign: usize,
    },
}

/// Errors raised while generating a SQL statement.
#[derive(Debug, Error)]
pub enum SqlGenError {
    /// Schema lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The statement requires at least one column/value pair.
    #[error("empty value map for table {0}")]
    EmptyValues(String),

    /// An UPDATE or DELETE would run without any WHERE bindings.
    #[error("no key bindings for {kind} on table {table}")]
    MissingKey {
        /// Target table.
        table: String,
        /// Statement kind ("UPDATE" or "DELETE").
        kind: &'static str,
    },
}

/// Result type alias for SQL generation.
pub type GenResult<T> = std::result::Result<T, SqlGenError>;
