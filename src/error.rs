use thiserror::Error;

/// Errors surfaced by the manager, the factory, and the backend connections.
///
/// Driver errors are never exposed directly: each backend classifies them as
/// either a [`ConnectionError`](DbManagerError::ConnectionError) (the session is
/// unusable) or a [`QueryError`](DbManagerError::QueryError) (the server rejected
/// the statement).
#[derive(Debug, Error)]
pub enum DbManagerError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Fixture error: {0}")]
    FixtureError(String),
}

impl DbManagerError {
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }

    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::QueryError(_))
    }
}

impl From<::config::ConfigError> for DbManagerError {
    fn from(err: ::config::ConfigError) -> Self {
        DbManagerError::ConfigError(err.to_string())
    }
}

impl From<csv::Error> for DbManagerError {
    fn from(err: csv::Error) -> Self {
        DbManagerError::FixtureError(err.to_string())
    }
}

pub type Result<T, E = DbManagerError> = std::result::Result<T, E>;
