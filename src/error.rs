// error.rs - Error types for fixture operations
//
// Shape and configuration errors are raised before any statement reaches the
// executor. Execution errors wrap whatever the executor reported with the
// table (and row) they belong to.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by an [`Executor`](crate::Executor).
#[derive(Debug, Error)]
pub enum ExecError {
    /// The database driver rejected or failed the statement.
    #[cfg(feature = "db-tools")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The statement did not finish before the configured deadline.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// Any other executor failure.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ExecError {
    /// Wraps an arbitrary error from a custom executor.
    pub fn other<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::Other(error.into())
    }
}

/// Errors that can occur while building or running fixture statements.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Setup needs at least one column to build an INSERT.
    #[error("table {table} has no columns")]
    EmptyColumns { table: String },

    /// A row tuple does not line up with the declared columns.
    #[error(
        "columns and rows[{row}] of table {table} must have the same length: expected {expected}, got {actual}"
    )]
    LengthMismatch {
        table: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A key names a column the table does not declare.
    #[error("column '{key}' not found in table {table}")]
    KeyNotFound { table: String, key: String },

    /// Cleanup was requested for a table without key columns.
    #[error("table {table} must have at least one key")]
    NoKeys { table: String },

    /// Cleanup was requested for a table without rows; the DELETE would have an empty WHERE.
    #[error("table {table} has no rows to clean up")]
    NoRows { table: String },

    /// Truncate was requested with no table names.
    #[error("no tables to truncate")]
    NoTables,

    /// Inserting one row failed.
    #[error("exec query for rows[{row}] of {table}: {source}")]
    Insert {
        table: String,
        row: usize,
        #[source]
        source: ExecError,
    },

    /// A single-table statement failed.
    #[error("exec query for {table}: {source}")]
    Exec {
        table: String,
        #[source]
        source: ExecError,
    },

    /// The batched multi-table truncate failed.
    #[error("error truncating tables: {source}")]
    Truncate {
        #[source]
        source: ExecError,
    },

    /// A member of a table set failed.
    #[error("table {table}: {source}")]
    Table {
        table: String,
        #[source]
        source: Box<FixtureError>,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Fixture file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture file is not valid JSON for a table definition.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixtureError {
    /// Rows or keys that do not line up with the declared columns.
    pub fn is_shape_error(&self) -> bool {
        match self {
            Self::EmptyColumns { .. } | Self::LengthMismatch { .. } | Self::KeyNotFound { .. } => {
                true
            }
            Self::Table { source, .. } => source.is_shape_error(),
            _ => false,
        }
    }

    /// An operation the table (or set) is not set up for, or bad settings.
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::NoKeys { .. } | Self::NoRows { .. } | Self::NoTables | Self::Config(_) => true,
            Self::Table { source, .. } => source.is_config_error(),
            _ => false,
        }
    }

    pub(crate) fn in_table(self, table: &str) -> Self {
        Self::Table {
            table: table.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
