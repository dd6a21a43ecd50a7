//! MySQL connection wrapper and the shared session handle.

use std::sync::Arc;

use mysql_async::prelude::*;
use mysql_async::{Conn, Params, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::MysqlConfig;
use crate::error::{MysqlError, MysqlResult};

/// A wrapper around one MySQL connection.
///
/// The connection is closed by [`MysqlConnection::close`]; any use after
/// that returns a connection error.
pub struct MysqlConnection {
    conn: Option<Conn>,
}

impl MysqlConnection {
    /// Open a new connection from configuration.
    pub async fn connect(config: &MysqlConfig) -> MysqlResult<Self> {
        debug!(host = %config.host, database = %config.database, "Connecting to MySQL");
        let conn = Conn::new(config.to_opts_builder()).await?;
        Ok(Self { conn: Some(conn) })
    }

    /// Wrap an already-open connection.
    pub fn new(conn: Conn) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn_mut(&mut self) -> MysqlResult<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| MysqlError::connection("connection is closed"))
    }

    /// Execute a query and return all rows.
    pub async fn query<T>(&mut self, query: &str) -> MysqlResult<Vec<T>>
    where
        T: FromRow + Send + 'static,
    {
        debug!(query = %query, "Executing query");
        let rows: Vec<T> = self.conn_mut()?.query(query).await?;
        Ok(rows)
    }

    /// Execute a query with parameters and return all rows.
    pub async fn query_params<T, P>(&mut self, query: &str, params: P) -> MysqlResult<Vec<T>>
    where
        T: FromRow + Send + 'static,
        P: Into<Params> + Send,
    {
        debug!(query = %query, "Executing parameterized query");
        let rows: Vec<T> = self.conn_mut()?.exec(query, params).await?;
        Ok(rows)
    }

    /// Execute raw SQL returning untyped rows.
    pub async fn query_raw(&mut self, query: &str) -> MysqlResult<Vec<Row>> {
        debug!(query = %query, "Executing raw query");
        let rows: Vec<Row> = self.conn_mut()?.query(query).await?;
        Ok(rows)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&mut self, query: &str) -> MysqlResult<u64> {
        debug!(query = %query, "Executing statement");
        let conn = self.conn_mut()?;
        conn.query_drop(query).await?;
        Ok(conn.affected_rows())
    }

    /// Execute a statement with parameters and return the number of
    /// affected rows.
    pub async fn execute_params<P>(&mut self, query: &str, params: P) -> MysqlResult<u64>
    where
        P: Into<Params> + Send,
    {
        debug!(query = %query, "Executing parameterized statement");
        let conn = self.conn_mut()?;
        conn.exec_drop(query, params).await?;
        Ok(conn.affected_rows())
    }

    /// Disconnect gracefully. Subsequent calls on this connection fail.
    pub async fn close(&mut self) -> MysqlResult<()> {
        if let Some(conn) = self.conn.take() {
            debug!("Closing MySQL connection");
            conn.disconnect().await?;
        }
        Ok(())
    }
}

/// A clonable handle to one logical MySQL session.
///
/// Planning, the migration ledger, and statement execution all share the
/// same underlying connection so that session-scoped state (current
/// database, SQL modes) stays consistent.
#[derive(Clone)]
pub struct MysqlSession {
    inner: Arc<Mutex<MysqlConnection>>,
    database: String,
}

impl MysqlSession {
    /// Open a session from configuration.
    pub async fn connect(config: &MysqlConfig) -> MysqlResult<Self> {
        let conn = MysqlConnection::connect(config).await?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
            database: config.database.clone(),
        })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: MysqlConnection, database: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conn)),
            database: database.into(),
        }
    }

    /// Name of the database this session is attached to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Execute a query and return all rows.
    pub async fn query<T>(&self, query: &str) -> MysqlResult<Vec<T>>
    where
        T: FromRow + Send + 'static,
    {
        self.inner.lock().await.query(query).await
    }

    /// Execute a query with parameters and return all rows.
    pub async fn query_params<T, P>(&self, query: &str, params: P) -> MysqlResult<Vec<T>>
    where
        T: FromRow + Send + 'static,
        P: Into<Params> + Send,
    {
        self.inner.lock().await.query_params(query, params).await
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&self, query: &str) -> MysqlResult<u64> {
        self.inner.lock().await.execute(query).await
    }

    /// Execute a statement with parameters and return the number of
    /// affected rows.
    pub async fn execute_params<P>(&self, query: &str, params: P) -> MysqlResult<u64>
    where
        P: Into<Params> + Send,
    {
        self.inner.lock().await.execute_params(query, params).await
    }

    /// Disconnect gracefully. Every clone of this session becomes unusable.
    pub async fn close(&self) -> MysqlResult<()> {
        self.inner.lock().await.close().await
    }
}
