use std::path::PathBuf;
use thiserror::Error;

/// Failure to coerce a single raw field, before row context is attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The value could not be read under its expected textual format.
    #[error("cannot parse {value:?} as {expected}")]
    Parse { value: String, expected: String },

    /// The value left after stripping currency/percent symbols is not a number.
    #[error("non-numeric value {value:?}")]
    Coercion { value: String },
}

impl FieldError {
    /// The offending raw value.
    pub fn value(&self) -> &str {
        match self {
            Self::Parse { value, .. } | Self::Coercion { value } => value,
        }
    }
}

/// All errors produced by the layoffs OLAP pipeline.
#[derive(Error, Debug)]
pub enum OlapError {
    /// A field in a data row failed to normalize. `row` is 0-based and
    /// excludes the header line.
    #[error("Row {row}, column `{column}`: {source}")]
    Field {
        row: usize,
        column: &'static str,
        #[source]
        source: FieldError,
    },

    /// A required column is absent from the input header.
    #[error("Missing required column: {column}")]
    Schema { column: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the olap crates.
pub type Result<T> = std::result::Result<T, OlapError>;
