//! Error types for the persistence orchestrator.

use clay_core::{SchemaError, SqlGenError};
use thiserror::Error;

/// Orchestrator errors.
///
/// The variants keep the failure taxonomy callers need for rollback
/// decisions: schema errors, statement-generation errors, and delegated
/// execution errors stay distinguishable. Absence of a matching row is not
/// an error anywhere in this crate; retrieval returns `None` or an empty
/// vector instead.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error from sqlx outside statement execution (connection
    /// acquisition, transaction begin/commit, row decoding).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Statement generation failed.
    #[error(transparent)]
    SqlGen(#[from] SqlGenError),

    /// A statement failed during execution, wrapped with its target table.
    #[error("executing statement on {table}: {source}")]
    Execute {
        /// Table the statement targeted.
        table: String,
        /// The underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// An operation needed a resolved identity value the record does not
    /// carry (e.g. keying an UPDATE, or propagating a parent key whose
    /// generation happened database-side without a readback path).
    #[error("identity value for table {0} is not resolved")]
    MissingIdentity(String),

    /// A graph save aborted partway through. `rows` is the number of rows
    /// affected before the failure.
    #[error("graph save aborted after {rows} affected rows: {source}")]
    PartialSave {
        /// Rows affected by the writes that succeeded.
        rows: u64,
        /// The failure that aborted the remaining subgraph.
        #[source]
        source: Box<OrmError>,
    },
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrmError>;
