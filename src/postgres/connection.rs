use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use super::config::build_pg_config;
use super::params::as_refs;
use super::query::build_raw_result;
use crate::blocking::driver_runtime;
use crate::config::ConnectionConfig;
use crate::connection::{AutoCommitTracker, Connection};
use crate::error::{DbManagerError, Result};
use crate::results::RawResult;
use crate::types::DbValue;

/// Blocking `PostgreSQL` connection.
pub struct PostgresConnection {
    session: Option<Session>,
    tx: AutoCommitTracker,
}

struct Session {
    client: Client,
    // Drives the socket; finishes once the client is gone and Terminate is sent
    connection_task: JoinHandle<()>,
    runtime: Runtime,
}

/// Open a `PostgreSQL` connection.
///
/// # Errors
/// `ConfigError` for an unusable URL, `ConnectionError` if the server cannot be
/// reached or rejects the credentials.
pub fn connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    Ok(Box::new(PostgresConnection::open(config)?))
}

impl PostgresConnection {
    /// # Errors
    /// See [`connect`].
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let pg_config = build_pg_config(config)?;
        let runtime = driver_runtime()?;
        let (client, connection_task) = runtime.block_on(async {
            let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
                DbManagerError::ConnectionError(format!("failed to connect to PostgreSQL: {e}"))
            })?;
            let connection_task = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "postgres connection task ended");
                }
            });
            Ok::<_, DbManagerError>((client, connection_task))
        })?;

        Ok(Self {
            session: Some(Session {
                client,
                connection_task,
                runtime,
            }),
            tx: AutoCommitTracker::default(),
        })
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or_else(|| {
            DbManagerError::ConnectionError("postgres connection is closed".to_string())
        })
    }

    fn simple(&self, sql: &str) -> Result<()> {
        let session = self.session()?;
        session.runtime.block_on(session.client.batch_execute(sql))?;
        Ok(())
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if self.tx.begin_needed() {
            self.simple("BEGIN")?;
            self.tx.mark_begun();
        }
        Ok(())
    }

    fn finish_transaction(&mut self, sql: &str) -> Result<()> {
        if self.tx.is_open() {
            self.simple(sql)?;
            self.tx.mark_finished();
        }
        Ok(())
    }
}

impl Connection for PostgresConnection {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        self.begin_if_needed()?;
        let session = self.session()?;
        let refs = as_refs(params);
        session.runtime.block_on(async {
            let stmt = session.client.prepare(sql).await?;
            let rows = session.client.query(&stmt, &refs).await?;
            build_raw_result(&stmt, &rows)
        })
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        self.begin_if_needed()?;
        let session = self.session()?;
        let refs = as_refs(params);
        Ok(session
            .runtime
            .block_on(session.client.execute(sql, &refs))?)
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
        self.session
            .as_ref()
            .is_none_or(|session| session.client.is_closed())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(Session {
            client,
            connection_task,
            runtime,
        }) = self.session.take()
        {
            if self.tx.is_open() {
                tracing::debug!("closing postgres connection with an open transaction");
                self.tx.mark_finished();
            }
            shut_down(&runtime, client, connection_task);
        }
        Ok(())
    }
}

/// Drop the client, then let the connection task run to completion so the server
/// receives Terminate instead of an abrupt EOF.
fn shut_down<C>(runtime: &Runtime, client: C, connection_task: JoinHandle<()>) {
    drop(client);
    if let Err(err) = runtime.block_on(connection_task) {
        tracing::debug!(error = %err, "postgres connection task did not finish cleanly");
    }
}
