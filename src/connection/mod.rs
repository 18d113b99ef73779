//! The connection capability every backend implements, plus the two wrappers the
//! manager uses to scope connection lifetimes per statement.

mod autocommit;
mod non_closing;
mod scoped;

pub use autocommit::AutoCommitTracker;
pub use non_closing::NonClosingConnection;
pub use scoped::ScopedConnection;

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::results::RawResult;
use crate::types::DbValue;

/// A live database session.
///
/// `sql` passed to [`query`](Connection::query) and [`execute`](Connection::execute)
/// is already in the backend's native placeholder style, and `params` has been checked
/// against the marker count. Implementations release their prepared statement and
/// cursor before returning, on success and on error.
///
/// Connections are used from one thread at a time but may be moved between threads.
///
/// Auto-commit starts enabled. Disabling it opens a transaction that stays open until
/// [`commit`](Connection::commit) or [`rollback`](Connection::rollback).
pub trait Connection: Send {
    /// Run a row-returning statement and collect every row.
    ///
    /// # Errors
    /// `QueryError` when the server rejects the statement, `ConnectionError` when the
    /// session is broken.
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult>;

    /// Run a mutation and return the affected-row count.
    ///
    /// # Errors
    /// Same as [`query`](Connection::query).
    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64>;

    fn auto_commit(&self) -> bool;

    /// # Errors
    /// Returns an error if the backend cannot start or finish the implicit transaction.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;

    /// # Errors
    /// Returns an error if the commit fails.
    fn commit(&mut self) -> Result<()>;

    /// # Errors
    /// Returns an error if the rollback fails.
    fn rollback(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;

    /// Release the session. Closing an already closed connection is a no-op.
    ///
    /// # Errors
    /// Returns an error if the backend reports a failure while shutting down.
    fn close(&mut self) -> Result<()>;
}

/// Opens a new connection from resolved credentials.
pub type Connector = fn(&ConnectionConfig) -> Result<Box<dyn Connection>>;
