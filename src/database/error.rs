//! Database-specific error types.

use thiserror::Error;

use crate::config::ConnectionError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors that can occur talking to the database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The connection config could not be turned into a client.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The HTTP request could not be sent or its body not read.
    #[error("request to ClickHouse failed: {0}")]
    Http(#[from] reqwest::Error),

    /// ClickHouse answered with an error status.
    #[error("ClickHouse returned HTTP {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error text from the response body.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to decode ClickHouse response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl DatabaseError {
    /// Create a server error, trimming the response body.
    pub fn server(status: u16, body: impl AsRef<str>) -> Self {
        Self::Server {
            status,
            message: body.as_ref().trim().to_string(),
        }
    }

    /// Whether the error came from the connection config rather than the server.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
