//! Error types for molgraf-data.

use thiserror::Error;

/// Error type for dataset loading and persistence.
#[derive(Debug, Error)]
pub enum DataError {
    /// Graph container error.
    #[error(transparent)]
    Graph(#[from] molgraf_core::GraphError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Binary (de)serialization error.
    #[error("serialization error: {0}")]
    Binary(#[from] bincode::Error),

    /// A requested column name is not in the table header.
    #[error("column '{0}' not found in table header")]
    MissingColumn(String),

    /// A requested column position is out of range.
    #[error("column position {0} out of range")]
    BadColumnIndex(usize),

    /// A cell failed to parse as a number.
    #[error("can not parse '{value}' in column '{column}', row {row}, as a number")]
    BadNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// A dataset method that needs the table was called before reading it.
    #[error("no table file has been read for dataset '{0}'")]
    MissingTable(String),

    /// A dataset method that needs a data directory found none set.
    #[error("data directory is not set for dataset '{0}'")]
    MissingDirectory(String),

    /// The table holds no data rows.
    #[error("table file contains no rows")]
    EmptyTable,

    /// A dataset kind tag without a registered loader.
    #[error("unknown dataset kind '{0}'")]
    UnknownDatasetKind(String),
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DataError>;
