use std::str::FromStr;

use sqlx::Connection as _;
use sqlx::mysql::MySqlConnectOptions;
use tokio::runtime::Runtime;

use super::query::{execute_batch, execute_dml, fetch_raw_result};
use crate::blocking::driver_runtime;
use crate::config::ConnectionConfig;
use crate::connection::{AutoCommitTracker, Connection};
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::DbValue;

/// Blocking MySQL connection.
pub struct MysqlConnection {
    session: Option<Session>,
    tx: AutoCommitTracker,
}

struct Session {
    conn: sqlx::MySqlConnection,
    runtime: Runtime,
}

/// Open a MySQL connection.
///
/// # Errors
/// `ConfigError` for an unusable URL, `ConnectionError` if the server cannot be
/// reached or rejects the credentials.
pub fn connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    Ok(Box::new(MysqlConnection::open(config)?))
}

impl MysqlConnection {
    /// # Errors
    /// See [`connect`].
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let options = connect_options(config)?;
        let runtime = driver_runtime()?;
        let conn = runtime
            .block_on(sqlx::MySqlConnection::connect_with(&options))
            .map_err(|e| DbManagerError::ConnectionError(format!("failed to connect to MySQL: {e}")))?;

        Ok(Self {
            session: Some(Session { conn, runtime }),
            tx: AutoCommitTracker::default(),
        })
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_else(|| {
            DbManagerError::ConnectionError("MySQL connection is closed".to_string())
        })
    }

    fn batch(&mut self, sql: &str) -> Result<()> {
        let Session { conn, runtime } = self.session()?;
        runtime.block_on(execute_batch(conn, sql))
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if self.tx.begin_needed() {
            self.batch("START TRANSACTION")?;
            self.tx.mark_begun();
        }
        Ok(())
    }

    fn finish_transaction(&mut self, sql: &str) -> Result<()> {
        if self.tx.is_open() {
            self.batch(sql)?;
            self.tx.mark_finished();
        }
        Ok(())
    }
}

fn connect_options(config: &ConnectionConfig) -> Result<MySqlConnectOptions> {
    let mut options = MySqlConnectOptions::from_str(config.url_without_jdbc_prefix())
        .map_err(|e| DbManagerError::ConfigError(format!("invalid MySQL url {}: {e}", config.url)))?;
    if !config.username.is_empty() {
        options = options.username(&config.username);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    Ok(options)
}

impl Connection for MysqlConnection {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        self.begin_if_needed()?;
        let Session { conn, runtime } = self.session()?;
        runtime.block_on(fetch_raw_result(conn, sql, params))
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        self.begin_if_needed()?;
        let Session { conn, runtime } = self.session()?;
        runtime.block_on(execute_dml(conn, sql, params))
    }

    fn auto_commit(&self) -> bool {
        self.tx.enabled()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if self.tx.commit_needed_for(enabled) {
            self.finish_transaction("COMMIT")?;
        }
        self.tx.set_enabled(enabled);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish_transaction("ROLLBACK")
    }

    fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(Session { conn, runtime }) = self.session.take() {
            self.tx.mark_finished();
            runtime.block_on(conn.close())?;
        }
        Ok(())
    }
}
