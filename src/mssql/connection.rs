use tiberius::Client;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::build_tiberius_config;
use super::query::{MssqlClient, build_raw_result, execute_batch, execute_dml};
use crate::blocking::driver_runtime;
use crate::config::ConnectionConfig;
use crate::connection::{AutoCommitTracker, Connection};
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::DbValue;

/// Blocking SQL Server connection.
pub struct MssqlConnection {
    session: Option<Session>,
    tx: AutoCommitTracker,
}

struct Session {
    client: MssqlClient,
    runtime: Runtime,
}

/// Open a SQL Server connection.
///
/// # Errors
/// `ConfigError` for an unusable URL, `ConnectionError` if the TCP connection or the
/// login fails.
pub fn connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    Ok(Box::new(MssqlConnection::open(config)?))
}

impl MssqlConnection {
    /// # Errors
    /// See [`connect`].
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let tiberius_config = build_tiberius_config(config)?;
        let runtime = driver_runtime()?;
        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(tiberius_config.get_addr())
                .await
                .map_err(|e| DbManagerError::ConnectionError(format!("TCP connection error: {e}")))?;
            tcp.set_nodelay(true)
                .map_err(|e| DbManagerError::ConnectionError(format!("TCP connection error: {e}")))?;

            Client::connect(tiberius_config, tcp.compat_write())
                .await
                .map_err(|e| {
                    DbManagerError::ConnectionError(format!("SQL Server connection error: {e}"))
                })
        })?;

        Ok(Self {
            session: Some(Session { client, runtime }),
            tx: AutoCommitTracker::default(),
        })
    }

    fn session(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or_else(|| {
            DbManagerError::ConnectionError("SQL Server connection is closed".to_string())
        })
    }

    fn batch(&mut self, sql: &str) -> Result<()> {
        let Session { client, runtime } = self.session()?;
        runtime.block_on(execute_batch(client, sql))
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if self.tx.begin_needed() {
            self.batch("BEGIN TRANSACTION")?;
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

impl Connection for MssqlConnection {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        self.begin_if_needed()?;
        let Session { client, runtime } = self.session()?;
        runtime.block_on(build_raw_result(client, sql, params))
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        self.begin_if_needed()?;
        let Session { client, runtime } = self.session()?;
        runtime.block_on(execute_dml(client, sql, params))
    }

    fn auto_commit(&self) -> bool {
        self.tx.enabled()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if self.tx.commit_needed_for(enabled) {
            self.finish_transaction("COMMIT TRANSACTION")?;
        }
        self.tx.set_enabled(enabled);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.finish_transaction("COMMIT TRANSACTION")
    }

    // XACT_ABORT or a deadlock may already have ended the transaction server side.
    fn rollback(&mut self) -> Result<()> {
        self.finish_transaction("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION")
    }

    fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(Session { client, runtime }) = self.session.take() {
            self.tx.mark_finished();
            runtime.block_on(client.close())?;
        }
        Ok(())
    }
}
