//! Connection lifecycle for one logical database session.
//!
//! A manager tracks at most one connection of its own. Outside a transaction every
//! statement runs on a fresh connection that is closed as soon as the statement is
//! done. While a transaction is active, statements borrow the tracked connection
//! through a [`NonClosingConnection`] so that their per-statement release leaves it
//! open until commit or rollback.
//!
//! Managers are meant for exclusive use by one thread at a time.

mod executor;
mod transaction;

use std::fmt;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, Connector, NonClosingConnection, ScopedConnection};
use crate::dialect::Dialect;
use crate::error::{DbManagerError, Result};
use crate::types::Backend;

/// Whether statements currently share a pinned transactional connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// Each statement gets its own auto-committed connection
    #[default]
    Autonomous,
    /// Statements share the tracked connection with auto-commit disabled
    Active,
}

/// Database access for one backend with fixed credentials.
pub struct DatabaseManager {
    backend: Backend,
    config: ConnectionConfig,
    connector: Connector,
    connection: Option<Box<dyn Connection>>,
    state: TransactionState,
}

impl DatabaseManager {
    /// Build a manager that opens connections with `connector`.
    ///
    /// [`DatabaseManagerFactory`](crate::factory::DatabaseManagerFactory) picks the
    /// connector for each backend; this constructor is for callers bringing their own.
    #[must_use]
    pub fn with_connector(backend: Backend, config: ConnectionConfig, connector: Connector) -> Self {
        Self {
            backend,
            config,
            connector,
            connection: None,
            state: TransactionState::Autonomous,
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[must_use]
    pub fn dialect(&self) -> &'static Dialect {
        self.backend.dialect()
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.state
    }

    /// Whether an open connection is currently tracked.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.as_deref().is_some_and(|conn| !conn.is_closed())
    }

    /// Open a new connection and track it, replacing (and closing) any previous one.
    ///
    /// A transaction still open on the replaced connection is abandoned; the server
    /// discards its uncommitted work.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the backend rejects the address or credentials.
    /// The previously tracked connection is kept in that case.
    pub fn connect(&mut self) -> Result<&mut (dyn Connection + 'static)> {
        let fresh = self.open_connection()?;

        if let Some(mut previous) = self.connection.take() {
            if self.state == TransactionState::Active {
                tracing::warn!(
                    backend = %self.backend,
                    "reconnecting with an active transaction; uncommitted work is discarded"
                );
            }
            if !previous.is_closed()
                && let Err(err) = previous.close()
            {
                tracing::debug!(error = %err, "ignoring close error on replaced connection");
            }
        }
        self.state = TransactionState::Autonomous;

        tracing::info!(backend = %self.backend, "connection established");
        let tracked = self.connection.insert(fresh);
        Ok(&mut **tracked)
    }

    /// Close the tracked connection. Does nothing if none is tracked or it is already closed.
    ///
    /// # Errors
    /// Returns the backend's error if closing an open connection fails.
    pub fn disconnect(&mut self) -> Result<()> {
        let was_active = self.state == TransactionState::Active;
        self.state = TransactionState::Autonomous;

        let Some(mut conn) = self.connection.take() else {
            return Ok(());
        };
        if conn.is_closed() {
            return Ok(());
        }
        if was_active {
            tracing::warn!(
                backend = %self.backend,
                "disconnecting with an active transaction; uncommitted work is discarded"
            );
        }
        conn.close()?;
        tracing::info!(backend = %self.backend, "connection closed");
        Ok(())
    }

    fn open_connection(&self) -> Result<Box<dyn Connection>> {
        tracing::debug!(
            backend = %self.backend,
            driver = %self.config.driver,
            url = %self.config.url,
            "opening connection"
        );
        (self.connector)(&self.config)
    }

    /// The connection a single statement should run on.
    ///
    /// Inside a transaction this is a non-closing view of the tracked connection;
    /// otherwise a brand-new connection that the scope closes when done.
    fn scoped_connection(&mut self) -> Result<ScopedConnection<'_>> {
        let pinned = self.state == TransactionState::Active
            && self
                .connection
                .as_deref()
                .is_some_and(|conn| !conn.is_closed() && !conn.auto_commit());

        if pinned {
            let conn = self.connection.as_deref_mut().ok_or_else(|| {
                DbManagerError::ConnectionError("transaction connection is gone".into())
            })?;
            return Ok(ScopedConnection::new(Box::new(NonClosingConnection::new(conn))));
        }

        Ok(ScopedConnection::new(self.open_connection()?))
    }

    fn tracked_open_connection(&mut self) -> Option<&mut (dyn Connection + 'static)> {
        self.connection
            .as_deref_mut()
            .filter(|conn| !conn.is_closed())
    }
}

impl fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Drop for DatabaseManager {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            tracing::debug!(error = %err, "ignoring disconnect error while dropping manager");
        }
    }
}
