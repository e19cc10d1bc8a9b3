use std::path::PathBuf;
use thiserror::Error;

/// Input table failed validation against the expected columns or value types.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table} table line {line}: invalid {column} value '{value}'")]
    InvalidValue {
        table: &'static str,
        line: u64,
        column: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed CSV in {table} table")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
