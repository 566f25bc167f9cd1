//! Transfer error types.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::config::ConnectionError;
use crate::database::DatabaseError;
use crate::flatfile::FlatFileError;
use crate::sql::{InvalidIdentifier, InvalidPredicate};

/// Result type for transfer workflows.
pub type TransferResult<T> = Result<T, TransferError>;

/// The step of a workflow that talked to the database when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovery,
    Preview,
    Export,
    CreateTable,
    Insert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Discovery => write!(f, "discovery"),
            Stage::Preview => write!(f, "preview"),
            Stage::Export => write!(f, "export"),
            Stage::CreateTable => write!(f, "create-table"),
            Stage::Insert => write!(f, "insert"),
        }
    }
}

/// Errors surfaced by transfer workflows.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Missing or unusable connection details or selection.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("file is empty")]
    EmptyFile,

    /// A selected column is missing its table or column name.
    #[error("column selection #{index} must name both a table and a column")]
    InvalidColumnSpec { index: usize },

    #[error("a join condition is required when more than one table is selected")]
    MissingJoinCondition,

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error(transparent)]
    InvalidJoinPredicate(#[from] InvalidPredicate),

    #[error("invalid delimiter {0:?}")]
    InvalidDelimiter(String),

    /// The database rejected a statement or could not be reached.
    #[error("{stage} failed: {message}")]
    QueryExecution { stage: Stage, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Map a database error raised during `stage`.
    ///
    /// Connection config problems stay configuration errors; everything
    /// else becomes [`TransferError::QueryExecution`].
    pub fn at(stage: Stage) -> impl FnOnce(DatabaseError) -> Self {
        move |err| match err {
            DatabaseError::Connection(e) => e.into(),
            other => Self::QueryExecution {
                stage,
                message: other.to_string(),
            },
        }
    }

    /// Whether the caller supplied bad input, as opposed to the transfer
    /// failing while executing.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::QueryExecution { .. } | Self::Io { .. })
    }
}

impl From<FlatFileError> for TransferError {
    fn from(err: FlatFileError) -> Self {
        match err {
            FlatFileError::EmptyFile => Self::EmptyFile,
            FlatFileError::InvalidDelimiter(d) => Self::InvalidDelimiter(d),
            FlatFileError::Io { context, source } => Self::Io { context, source },
            FlatFileError::Parse(source) => Self::Io {
                context: "failed to parse delimited text".to_string(),
                source: source.into(),
            },
            FlatFileError::Csv { path, source } => Self::Io {
                context: format!("failed to write {}", path.display()),
                source: source.into(),
            },
        }
    }
}

impl From<ConnectionError> for TransferError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::InvalidName(e) => Self::InvalidIdentifier(e),
            other => Self::Configuration(other.to_string()),
        }
    }
}
