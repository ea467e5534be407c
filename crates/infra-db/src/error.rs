//! Error types for connection management and statement execution.

use thiserror::Error;

/// Result type alias for statement, cursor and close operations.
pub type DbResult<T> = Result<T, DbError>;

/// Failures while building a [`crate::ConnectionManager`]. A manager that
/// failed to build cannot be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionInitError {
    #[error("no driver registered under {0:?}")]
    DriverNotFound(String),

    #[error("driver {driver:?} does not accept url {url:?}")]
    UrlRejected { driver: String, url: String },

    #[error("unknown naming context factory {0:?}")]
    UnknownContextFactory(String),

    #[error("nothing bound to {name:?} at {provider_url:?}")]
    NameNotBound { name: String, provider_url: String },

    #[error("naming lookup failed: {0}")]
    Naming(String),
}

/// Failure to obtain a connection on one `create_connection` call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("cannot reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("data source {name:?} refused a connection: {reason}")]
    DataSource { name: String, reason: String },

    #[error("authentication failed for {user:?}")]
    Auth { user: String },
}

/// Errors raised while preparing or running statements, reading rows or
/// closing resources.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("{0} is closed")]
    Closed(&'static str),

    #[error("unsupported statement: {0}")]
    Unsupported(String),
}
