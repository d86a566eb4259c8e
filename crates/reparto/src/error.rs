// File: src/error.rs
// Purpose: Error types for the store and the generic DAO

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the connection lifecycle
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to inspect {path:?}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create database directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema bootstrap of {path:?} failed at statement {index}: {source}")]
    Bootstrap {
        path: PathBuf,
        index: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to move bootstrapped database into place at {path:?}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open database {path:?}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Failures of a DAO call
///
/// Everything except `Store` is a caller error detected before any
/// connection is opened.
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("{attrs} attribute(s) but {values} value(s)")]
    ArityMismatch { attrs: usize, values: usize },

    #[error("at least one attribute is required")]
    NoAttributes,

    #[error("{0:?} is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error("table {0:?} is not in the allowed table list")]
    TableNotAllowed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for DaoError {
    fn from(err: sqlx::Error) -> Self {
        DaoError::Store(StoreError::Sql(err))
    }
}

impl DaoError {
    /// True when the caller passed something the DAO refused to run
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, DaoError::Store(_))
    }
}
