use super::{DatabaseManager, TransactionState};
use crate::error::Result;

impl DatabaseManager {
    /// Pin the tracked connection and turn auto-commit off.
    ///
    /// Connects first if no open connection is tracked. Nested transactions are not
    /// supported: calling this again before commit/rollback only re-disables auto-commit
    /// on the same connection.
    ///
    /// # Errors
    /// Returns `ConnectionError` if connecting fails, or the backend's error if
    /// auto-commit cannot be disabled.
    pub fn begin_transaction(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.connect()?;
        }
        if let Some(conn) = self.tracked_open_connection() {
            conn.set_auto_commit(false)?;
        }
        self.state = TransactionState::Active;
        tracing::info!(backend = %self.backend, "transaction started");
        Ok(())
    }

    /// Commit pending work and return to auto-commit. No-op without an open tracked connection.
    ///
    /// A failed statement never rolls back on its own; the caller decides between
    /// this and [`rollback_transaction`](DatabaseManager::rollback_transaction).
    ///
    /// # Errors
    /// Returns the backend's error if the commit fails; the transaction then stays active.
    pub fn commit_transaction(&mut self) -> Result<()> {
        let Some(conn) = self.tracked_open_connection() else {
            self.state = TransactionState::Autonomous;
            return Ok(());
        };
        conn.commit()?;
        conn.set_auto_commit(true)?;
        self.state = TransactionState::Autonomous;
        tracing::info!(backend = %self.backend, "transaction committed");
        Ok(())
    }

    /// Discard pending work and return to auto-commit. No-op without an open tracked connection.
    ///
    /// # Errors
    /// Returns the backend's error if the rollback fails; the transaction then stays active.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let Some(conn) = self.tracked_open_connection() else {
            self.state = TransactionState::Autonomous;
            return Ok(());
        };
        conn.rollback()?;
        conn.set_auto_commit(true)?;
        self.state = TransactionState::Autonomous;
        tracing::info!(backend = %self.backend, "transaction rolled back");
        Ok(())
    }
}
