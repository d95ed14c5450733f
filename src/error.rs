//! Error types for loading and transforming.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path:?} line {line}: {message}")]
    Record {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// Structural failures. Row-level problems never surface here; they are
/// tallied as exclusions instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("required source table {0} is missing or empty")]
    EmptyTable(&'static str),
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
