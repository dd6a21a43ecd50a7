//! Error types for MySQL operations.

use thiserror::Error;

/// Result type alias for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Errors raised while connecting to or talking to MySQL.
#[derive(Debug, Error)]
pub enum MysqlError {
    /// Configuration error (bad URL, missing database name).
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection lifecycle error.
    #[error("connection error: {0}")]
    Connection(String),

    /// A query returned an unexpected shape.
    #[error("query error: {0}")]
    Query(String),

    /// MySQL driver error.
    #[error("mysql error: {0}")]
    Driver(#[from] mysql_async::Error),
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MysqlError::config("invalid url");
        assert!(err.to_string().contains("configuration error"));
        assert!(err.to_string().contains("invalid url"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(MysqlError::config("x"), MysqlError::Config(_)));
        assert!(matches!(
            MysqlError::connection("x"),
            MysqlError::Connection(_)
        ));
        assert!(matches!(MysqlError::query("x"), MysqlError::Query(_)));
    }
}
